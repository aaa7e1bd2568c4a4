use bevy::asset::{LoadState, RenderAssetUsages};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::cache::GridCache;
use crate::grid::GridMesh;
use crate::heightmap::Heightmap;
use crate::surface::{TerrainMeshData, build_terrain_mesh_data};
use crate::types::{HeightmapSource, Terrain, TerrainConfig};

/// Image heightmap requested at startup and not yet turned into a mesh.
#[derive(Resource, Clone)]
pub struct PendingHeightmap(pub Handle<Image>);

pub fn setup_terrain(
    mut commands: Commands,
    config: Res<TerrainConfig>,
    asset_server: Res<AssetServer>,
    mut cache: ResMut<GridCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if let Err(e) = config.validate() {
        error!("{e}");
        return;
    }

    let heightmap = match &config.heightmap {
        HeightmapSource::Flat => Heightmap::flat(),
        HeightmapSource::Perlin(settings) => Heightmap::perlin(settings),
        HeightmapSource::Image { path } => {
            info!("loading heightmap {path}");
            let handle: Handle<Image> = asset_server.load(path.clone());
            commands.insert_resource(PendingHeightmap(handle));
            return;
        }
    };

    spawn_terrain(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut cache,
        &config,
        &heightmap,
    );
}

pub fn finish_heightmap_load(
    mut commands: Commands,
    pending: Option<Res<PendingHeightmap>>,
    images: Res<Assets<Image>>,
    asset_server: Res<AssetServer>,
    config: Res<TerrainConfig>,
    mut cache: ResMut<GridCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(pending) = pending else {
        return;
    };

    let Some(image) = images.get(&pending.0) else {
        // If the load failed, don't wait forever.
        if let Some(LoadState::Failed(e)) = asset_server.get_load_state(pending.0.id()) {
            error!("failed to load heightmap image: {e}");
            commands.remove_resource::<PendingHeightmap>();
        }
        return;
    };

    commands.remove_resource::<PendingHeightmap>();

    match Heightmap::from_image(image) {
        Ok(heightmap) => {
            spawn_terrain(
                &mut commands,
                &mut meshes,
                &mut materials,
                &mut cache,
                &config,
                &heightmap,
            );
        }
        Err(e) => error!("{e}"),
    }
}

pub fn spawn_terrain(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cache: &mut GridCache,
    config: &TerrainConfig,
    heightmap: &Heightmap,
) -> Option<Entity> {
    let grid = match cache.get_or_build(config.depth) {
        Ok(grid) => grid,
        Err(e) => {
            error!("{e}");
            return None;
        }
    };

    let data = build_terrain_mesh_data(&grid, heightmap, config);
    info!(
        "spawning terrain: depth={} vertices={} indices={} heightmap={}x{}",
        grid.depth(),
        data.positions.len(),
        data.indices.len(),
        heightmap.width(),
        heightmap.height()
    );

    let mesh_handle = meshes.add(mesh_from_terrain_mesh_data(&grid, data));

    let (r, g, b) = config.color_srgb;
    // Triangle winding follows the grid's emission order, not a front-face convention.
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(r, g, b),
        perceptual_roughness: 1.0,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    let entity = commands
        .spawn((
            Terrain,
            Mesh3d(mesh_handle),
            MeshMaterial3d(material),
            Transform::IDENTITY,
        ))
        .id();
    Some(entity)
}

/// Uploads 16-bit indices whenever every vertex of the grid is addressable with them.
fn mesh_from_terrain_mesh_data(grid: &GridMesh, data: TerrainMeshData) -> Mesh {
    let indices = match grid.indices_u16() {
        Ok(narrow) => Indices::U16(narrow),
        Err(_) => Indices::U32(data.indices),
    };

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, data.positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, data.normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, data.uvs);
    mesh.insert_indices(indices);
    mesh
}
