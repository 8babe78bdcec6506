use bevy::prelude::*;
use roomfire_simulation::{logger, SandboxPhysicsPlugin, SandboxPlugin};

mod camera;
mod rendering;
mod xr_emulation;

use camera::HeadsetCameraPlugin;
use rendering::RenderingPlugin;
use xr_emulation::XrEmulationPlugin;

fn main() {
    logger::init_logger();
    logger::set_log_level(logger::LogLevel::Info);

    App::new()
        // Bevy defaults (rendering, input, time, etc.)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "ROOMFIRE - Desktop Sandbox".to_string(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        // Simulation (headless ECS logic) + Rapier step
        .add_plugins((SandboxPlugin, SandboxPhysicsPlugin))
        // Emulated headset: room, hit-test, controllers
        .add_plugins(XrEmulationPlugin)
        // VisualShape → meshes / gizmos
        .add_plugins(RenderingPlugin)
        // Camera = голова пользователя
        .add_plugins(HeadsetCameraPlugin)
        .add_systems(Startup, setup_scene)
        .run();
}

/// Lights + камера-"шлем"
fn setup_scene(mut commands: Commands) {
    // Directional light (sun)
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4)),
    ));

    // Ambient light
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        affects_lightmapped_meshes: false,
    });

    // Камера стоит в origin, как viewer в начале XR сессии
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.0, 0.0),
        camera::HeadsetCamera::default(),
    ));
}
