//! World grid storage and chunk addressing.
//!
//! Tiles live in a flat row-major vector; chunk addressing is a pure
//! function of the coordinate and the configured chunk size. Out-of-bounds
//! coordinates are a caller contract violation and fail fast.

use bevy::math::UVec2;
use bevy::prelude::Resource;

use crate::content::{Block, BlockId};
use crate::teams::TeamId;

/// Health assigned to freshly placed build state.
const BUILD_HEALTH: f32 = 100.0;

/// Chunk that owns a tile coordinate.
#[inline]
pub fn chunk_of(pos: UVec2, chunk_size: u32) -> UVec2 {
    UVec2::new(pos.x / chunk_size, pos.y / chunk_size)
}

/// Offset of a tile within its chunk.
#[inline]
pub fn local_offset(pos: UVec2, chunk_size: u32) -> UVec2 {
    UVec2::new(pos.x % chunk_size, pos.y % chunk_size)
}

/// Mutable state attached to a placed building.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildState {
    pub health: f32,
    /// Set when the building takes damage; cleared when the structure leaves
    /// the index, since its damage history is then meaningless.
    pub was_damaged: bool,
}

impl BuildState {
    pub fn new(health: f32) -> Self {
        Self {
            health,
            was_damaged: false,
        }
    }

    /// Applies damage and remembers that the building was hit.
    pub fn damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
        self.was_damaged = true;
    }
}

/// One grid cell: at most one structure and at most one overlay, both
/// independent and possibly empty.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub block: BlockId,
    pub team: TeamId,
    /// Overlay block (ore deposits and similar); independent of the
    /// structure occupying the tile.
    pub overlay: Option<BlockId>,
    /// Present iff the current block creates build state.
    pub build: Option<BuildState>,
}

/// Flat row-major tile storage for the active map.
#[derive(Resource, Debug, Clone)]
pub struct WorldGrid {
    size: UVec2,
    tiles: Vec<Tile>,
}

impl WorldGrid {
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            tiles: vec![Tile::default(); (size.x * size.y) as usize],
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, pos: UVec2) -> bool {
        pos.x < self.size.x && pos.y < self.size.y
    }

    /// Flat index of a coordinate.
    ///
    /// # Panics
    /// Panics on out-of-bounds coordinates; callers must only address tiles
    /// that exist.
    #[inline]
    pub fn index_of(&self, pos: UVec2) -> u32 {
        assert!(
            self.in_bounds(pos),
            "tile ({}, {}) outside {}x{} grid",
            pos.x,
            pos.y,
            self.size.x,
            self.size.y
        );
        pos.y * self.size.x + pos.x
    }

    /// Coordinate of a flat index.
    #[inline]
    pub fn pos_of(&self, index: u32) -> UVec2 {
        UVec2::new(index % self.size.x, index / self.size.x)
    }

    pub fn tile(&self, pos: UVec2) -> &Tile {
        let index = self.index_of(pos);
        &self.tiles[index as usize]
    }

    pub fn tile_mut(&mut self, pos: UVec2) -> &mut Tile {
        let index = self.index_of(pos);
        &mut self.tiles[index as usize]
    }

    /// Replaces the structure on a tile. Building-type blocks get fresh
    /// build state; floor-type blocks clear it.
    pub fn set_block(&mut self, pos: UVec2, block: &Block, team: TeamId) {
        let tile = self.tile_mut(pos);
        tile.block = block.id;
        tile.team = team;
        tile.build = block
            .has_building
            .then(|| BuildState::new(BUILD_HEALTH));
    }

    pub fn set_overlay(&mut self, pos: UVec2, overlay: Option<BlockId>) {
        self.tile_mut(pos).overlay = overlay;
    }

    /// Clears the structure back to air. The overlay survives: ore deposits
    /// outlive the buildings placed on top of them.
    pub fn clear_block(&mut self, pos: UVec2) {
        let tile = self.tile_mut(pos);
        tile.block = BlockId::AIR;
        tile.team = TeamId::DERELICT;
        tile.build = None;
    }

    /// Iterate over all tiles with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (UVec2, &Tile)> {
        let width = self.size.x;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (UVec2::new(index % width, index / width), tile)
        })
    }
}
