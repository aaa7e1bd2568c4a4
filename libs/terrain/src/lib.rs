pub mod cache;
pub mod grid;
pub mod heightmap;
pub mod render;
pub mod surface;
pub mod types;

pub use cache::GridCache;
pub use grid::{GridError, GridMesh, build_grid};
pub use heightmap::{Heightmap, HeightmapError};
pub use surface::{TerrainMeshData, build_terrain_mesh_data};
pub use types::*;

use bevy::prelude::*;

pub struct TerrainPlugin {
    pub config: types::TerrainConfig,
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .init_resource::<GridCache>()
            .add_systems(Startup, render::setup_terrain)
            .add_systems(Update, render::finish_heightmap_load);
    }
}
