use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use bevy::math::UVec2;
use world_index::{ContentRegistry, StructureIndex, TeamId, TeamRegistry, WorldConfig, WorldGrid};

pub const SHARDED: TeamId = TeamId(1);
pub const BLUE: TeamId = TeamId(2);

/// Directly constructed world state, bypassing the bevy app shell, for tests
/// that drive the index API by hand.
pub struct IndexHarness {
    pub content: ContentRegistry,
    pub grid: WorldGrid,
    pub index: StructureIndex,
    pub teams: TeamRegistry,
}

pub fn harness() -> IndexHarness {
    harness_with_content(ContentRegistry::builtin())
}

/// Harness whose registry also contains the fixture catalog, exercising the
/// modded-content path. The index must be sized after all catalogs load.
pub fn harness_with_fixture_catalog() -> anyhow::Result<IndexHarness> {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("extra_block_catalog.json");
    let catalog = fs::read_to_string(&fixture)
        .with_context(|| format!("missing fixture catalog at {}", fixture.display()))?;

    let mut content = ContentRegistry::builtin();
    let _ = content
        .load_catalog_from_str(&catalog)
        .context("fixture catalog should parse")?;
    Ok(harness_with_content(content))
}

fn harness_with_content(content: ContentRegistry) -> IndexHarness {
    let config = WorldConfig {
        grid_size: UVec2::new(64, 64),
        ..WorldConfig::default()
    };
    let grid = WorldGrid::new(config.grid_size);
    let index = StructureIndex::new(&config, &content);
    let teams = TeamRegistry::new(config.base_unit_cap);
    IndexHarness {
        content,
        grid,
        index,
        teams,
    }
}
