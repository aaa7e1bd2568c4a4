use bevy::prelude::*;
use terrain::{TerrainConfig, TerrainPlugin};

const CONFIG_PATH: &str = "assets/terrain.ron";

fn main() {
    let mut app = App::new();
    app.insert_resource(ClearColor(Color::srgb(0.60, 0.80, 0.95)))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 30.0,
            affects_lightmapped_meshes: false,
        })
        .add_plugins(DefaultPlugins);

    // Logging is live once DefaultPlugins has been added.
    let config = match TerrainConfig::from_ron_file(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; using default terrain config");
            TerrainConfig::default()
        }
    };

    app.add_plugins(TerrainPlugin { config })
        .add_systems(Startup, setup_scene)
        .run();
}

fn setup_scene(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 3.0, 4.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(3.0, 6.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
