//! Structure index core for a tile-based simulation.
//!
//! Maintains denormalized presence tables and per-chunk capability-flag sets
//! over a rectangular tile grid, updated incrementally as structures are
//! placed and removed. Answers presence queries (`has_ore`,
//! `is_block_present`) in O(1) and enemy/flagged capability queries without
//! full-grid rescans, while folding secondary effects (team unit-cap
//! bookkeeping, damage-indicator resets) into the same mutation transaction.

mod content;
mod grid;
mod index;
mod resources;
mod systems;
mod teams;

use bevy::prelude::*;

pub use content::{
    Block, BlockFlags, BlockId, ContentCatalogError, ContentRegistry, Item, ItemId,
    BUILTIN_BLOCK_CATALOG,
};
pub use grid::{chunk_of, local_offset, BuildState, Tile, WorldGrid};
pub use index::StructureIndex;
pub use resources::WorldConfig;
pub use systems::{apply_structure_events, initialize_index, StructureEvent};
pub use teams::{TeamData, TeamId, TeamRegistry};

/// Construct a bevy [`App`] wired with the world grid, content and team
/// registries, and the structure index.
///
/// The index is rebuilt from live tile state at startup and queued
/// [`StructureEvent`]s are applied on every update.
pub fn build_headless_app() -> App {
    let mut app = App::new();

    let config = WorldConfig::default();
    let content = ContentRegistry::builtin();
    let grid = WorldGrid::new(config.grid_size);
    let index = StructureIndex::new(&config, &content);
    let teams = TeamRegistry::new(config.base_unit_cap);

    app.insert_resource(config)
        .insert_resource(content)
        .insert_resource(grid)
        .insert_resource(index)
        .insert_resource(teams)
        .add_plugins(MinimalPlugins)
        .add_event::<StructureEvent>()
        .add_systems(Startup, systems::initialize_index)
        .add_systems(Update, systems::apply_structure_events);

    app
}

/// Run one simulation step, applying queued structure events.
pub fn run_step(app: &mut App) {
    app.update();
}
