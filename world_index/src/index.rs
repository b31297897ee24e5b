//! Incremental spatial/attribute index over the world grid.
//!
//! The index answers presence questions ("does any tile yield copper", "is
//! any battery placed") in O(1) via reference-counted tables, and capability
//! queries ("enemy structures exposing the core flag") by walking a chunked
//! arena of per-(team, flag) tile sets instead of rescanning the grid.
//!
//! Writers are expected to be strictly serialized on the simulation update
//! thread; every mutation entry point completes synchronously and leaves the
//! index consistent for the queries that follow it.

use std::collections::{BTreeMap, BTreeSet};

use bevy::math::UVec2;
use bevy::prelude::Resource;
use tracing::{debug, trace};

use crate::content::{BlockFlags, BlockId, ContentRegistry, ItemId};
use crate::grid::{chunk_of, Tile, WorldGrid};
use crate::resources::WorldConfig;
use crate::teams::{TeamId, TeamRegistry};

/// Per-chunk mapping from (team, capability flag) to the flat indices of
/// tiles whose structures expose that flag.
///
/// Invariant: a tile index appears in the set for `(team, flag)` iff that
/// tile currently holds a build owned by `team` whose block declares `flag`.
#[derive(Debug, Clone, Default)]
struct ChunkFlagSets {
    slots: BTreeMap<(TeamId, BlockFlags), BTreeSet<u32>>,
}

impl ChunkFlagSets {
    fn insert(&mut self, team: TeamId, flag: BlockFlags, tile: u32) -> bool {
        self.slots.entry((team, flag)).or_default().insert(tile)
    }

    fn remove(&mut self, team: TeamId, flag: BlockFlags, tile: u32) {
        if let Some(set) = self.slots.get_mut(&(team, flag)) {
            let _ = set.remove(&tile);
            if set.is_empty() {
                let _ = self.slots.remove(&(team, flag));
            }
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Structure index over the active map.
///
/// Holds no ownership over tiles, blocks, items, or teams; only flat tile
/// indices and numeric content ids back-referencing externally owned state.
#[derive(Resource, Debug, Clone)]
pub struct StructureIndex {
    grid_size: UVec2,
    chunk_size: u32,
    chunks_x: u32,
    /// Reference counts keyed by item id: how many tiles currently yield
    /// each item through their overlay.
    ore_counts: Vec<u32>,
    /// Reference counts keyed by block id: how many tiles currently carry
    /// each block.
    block_counts: Vec<u32>,
    /// Chunk arena in row-major chunk order.
    chunks: Vec<ChunkFlagSets>,
}

impl StructureIndex {
    /// Empty index sized for the configured grid and the registered content.
    pub fn new(config: &WorldConfig, content: &ContentRegistry) -> Self {
        let chunks_x = config.grid_size.x.div_ceil(config.chunk_size);
        let chunks_y = config.grid_size.y.div_ceil(config.chunk_size);
        Self {
            grid_size: config.grid_size,
            chunk_size: config.chunk_size,
            chunks_x,
            ore_counts: vec![0; content.item_count()],
            block_counts: vec![0; content.block_count()],
            chunks: vec![ChunkFlagSets::default(); (chunks_x * chunks_y) as usize],
        }
    }

    #[inline]
    fn chunk_index(&self, pos: UVec2) -> usize {
        let chunk = chunk_of(pos, self.chunk_size);
        (chunk.y * self.chunks_x + chunk.x) as usize
    }

    #[inline]
    fn pos_of(&self, index: u32) -> UVec2 {
        UVec2::new(index % self.grid_size.x, index / self.grid_size.x)
    }

    fn overlay_yield(content: &ContentRegistry, tile: &Tile) -> Option<ItemId> {
        tile.overlay
            .and_then(|overlay| content.block(overlay))
            .and_then(|block| block.item_drop)
    }

    /// Indexes a tile's current structure and overlay.
    ///
    /// Chunk-set membership is idempotent; the presence tables are not, so
    /// callers must pair every `add_index` with a `remove_index` when a tile
    /// changes.
    pub fn add_index(&mut self, grid: &WorldGrid, content: &ContentRegistry, pos: UVec2) {
        let tile_index = grid.index_of(pos);
        let tile = grid.tile(pos);

        if let Some(item) = Self::overlay_yield(content, tile) {
            if let Some(count) = self.ore_counts.get_mut(item.index()) {
                *count += 1;
            }
        }

        if let Some(count) = self.block_counts.get_mut(tile.block.index()) {
            *count += 1;
        }

        if tile.build.is_some() {
            if let Some(block) = content.block(tile.block) {
                let chunk = self.chunk_index(pos);
                for flag in block.flags.iter() {
                    let _ = self.chunks[chunk].insert(tile.team, flag, tile_index);
                }
            }
        }

        trace!(x = pos.x, y = pos.y, block = %tile.block, "indexed tile");
    }

    /// Unindexes a tile before its structure is cleared or replaced.
    ///
    /// One transaction: presence counts decrement, the tile leaves every
    /// matching chunk set, the owning team's unit cap drops by the block's
    /// modifier, and the build's damage indicator resets. Afterwards no
    /// query can observe the removed tile. Unindexed tiles are a no-op for
    /// the tables (counts saturate at zero).
    pub fn remove_index(
        &mut self,
        grid: &mut WorldGrid,
        content: &ContentRegistry,
        teams: &mut TeamRegistry,
        pos: UVec2,
    ) {
        let tile_index = grid.index_of(pos);
        let chunk = self.chunk_index(pos);
        let tile = grid.tile_mut(pos);

        if let Some(item) = Self::overlay_yield(content, tile) {
            if let Some(count) = self.ore_counts.get_mut(item.index()) {
                *count = count.saturating_sub(1);
            }
        }

        if let Some(count) = self.block_counts.get_mut(tile.block.index()) {
            *count = count.saturating_sub(1);
        }

        if tile.build.is_some() {
            if let Some(block) = content.block(tile.block) {
                for flag in block.flags.iter() {
                    self.chunks[chunk].remove(tile.team, flag, tile_index);
                }
                teams.apply_removal(tile.team, block);
            }
        }

        if let Some(build) = tile.build.as_mut() {
            // The structure leaves the world; its damage history goes with it.
            build.was_damaged = false;
        }

        trace!(x = pos.x, y = pos.y, block = %tile.block, "unindexed tile");
    }

    /// Whether any tile's overlay currently yields `item`. Unregistered ids
    /// answer `false`.
    pub fn has_ore(&self, item: ItemId) -> bool {
        self.ore_counts
            .get(item.index())
            .is_some_and(|count| *count > 0)
    }

    /// Whether any tile currently carries `block`. Unregistered ids answer
    /// `false`.
    pub fn is_block_present(&self, block: BlockId) -> bool {
        self.block_counts
            .get(block.index())
            .is_some_and(|count| *count > 0)
    }

    fn collect_flagged(
        &self,
        flag: BlockFlags,
        mut include: impl FnMut(TeamId) -> bool,
    ) -> Vec<UVec2> {
        let mut out = Vec::new();
        for chunk in &self.chunks {
            for ((owner, slot_flag), tiles) in &chunk.slots {
                if *slot_flag != flag || !include(*owner) {
                    continue;
                }
                out.extend(tiles.iter().map(|&tile| self.pos_of(tile)));
            }
        }
        out
    }

    /// Tiles of teams other than `team` whose structures expose `flag`.
    ///
    /// Computed fresh from the live chunk sets, walking only chunks that
    /// hold matching structures. Iteration order is chunk traversal
    /// (row-major), then set order within a chunk; deterministic but not a
    /// contract. Empty when nothing matches.
    pub fn get_enemy(&self, team: TeamId, flag: BlockFlags) -> Vec<UVec2> {
        self.collect_flagged(flag, |owner| owner != team)
    }

    /// Tiles of `team` whose structures expose `flag`. Same contract as
    /// [`StructureIndex::get_enemy`], team-restricted instead of
    /// team-excluded.
    pub fn get_flagged(&self, team: TeamId, flag: BlockFlags) -> Vec<UVec2> {
        self.collect_flagged(flag, |owner| owner == team)
    }

    /// Drops all derived state and re-indexes every tile. The index is never
    /// persisted; this runs on world (re)load.
    pub fn rebuild(&mut self, grid: &WorldGrid, content: &ContentRegistry) {
        for count in &mut self.ore_counts {
            *count = 0;
        }
        for count in &mut self.block_counts {
            *count = 0;
        }
        for chunk in &mut self.chunks {
            chunk.clear();
        }
        for (pos, _tile) in grid.iter() {
            self.add_index(grid, content, pos);
        }
        debug!(
            width = grid.size().x,
            height = grid.size().y,
            "rebuilt structure index from live tile state"
        );
    }
}
