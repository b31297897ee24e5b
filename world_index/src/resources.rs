//! Shared configuration resources.

use bevy::{math::UVec2, prelude::Resource};

/// Global configuration for the world grid and structure index.
#[derive(Resource, Debug, Clone)]
pub struct WorldConfig {
    /// Map dimensions in tiles.
    pub grid_size: UVec2,
    /// Side length of the square chunks partitioning the grid. Constant for
    /// the lifetime of a map.
    pub chunk_size: u32,
    /// Unit cap every team starts from before structure modifiers apply.
    pub base_unit_cap: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: UVec2::new(96, 64),
            chunk_size: 16,
            base_unit_cap: 0,
        }
    }
}
