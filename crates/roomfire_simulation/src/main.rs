//! Headless прогон ROOMFIRE
//!
//! Скриптованная сессия с физикой: пол, стол, пара плоскостей, очередь выстрелов.
//! Без рендера — для проверки связки tracker + projectiles + Rapier.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use std::time::Duration;

use roomfire_simulation::xr::synthetic::{box_surface, grid_surface};
use roomfire_simulation::{
    logger, Capability, DeterministicRng, Handedness, Pose, ProjectileManager, RoomMeshStats,
    SandboxPhysicsPlugin, SandboxPlugin, SelectStart, SessionEnded, SessionStarted, FRAME_DT,
};

const FLOOR_Y: f32 = -1.4;
const TICKS: u32 = 1200;

fn main() {
    let seed = 42;
    logger::init_logger();
    logger::set_log_level(logger::LogLevel::Info);
    logger::log_info(&format!("Starting ROOMFIRE headless session (seed: {})", seed));

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, TransformPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME_DT)))
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins((SandboxPlugin, SandboxPhysicsPlugin))
        .add_systems(First, scripted_xr_input);

    for tick in 0..TICKS {
        app.update();

        if tick % 200 == 0 {
            let world = app.world();
            let projectiles = world.resource::<ProjectileManager>().len();
            let stats = world.resource::<RoomMeshStats>();
            logger::log_info(&format!(
                "Tick {}: {} projectiles, {} room surfaces, {} entities",
                tick,
                projectiles,
                stats.tracked,
                world.entities().len()
            ));
        }
    }

    app.world_mut().send_event(SessionEnded);
    app.update();
    logger::log_info("Session complete!");
}

/// Имитация XR runtime: фиксированная комната, выстрел каждые 10 кадров
fn scripted_xr_input(
    mut frame: Local<u32>,
    mut hit_test: ResMut<roomfire_simulation::HitTestFeed>,
    mut surfaces: ResMut<roomfire_simulation::DetectedSurfaceFeed>,
    mut viewer: ResMut<roomfire_simulation::ViewerPose>,
    mut hands: ResMut<roomfire_simulation::TrackedHands>,
    mut started: EventWriter<SessionStarted>,
    mut selects: EventWriter<SelectStart>,
) {
    let n = *frame;
    *frame += 1;

    if n == 0 {
        started.write(SessionStarted);
        return;
    }

    hit_test.capability = Capability::Ready;
    hit_test.hits = vec![Pose::from_position(Vec3::new(0.0, FLOOR_Y, -1.5))];

    // Стол "уточняется" runtime каждые 300 кадров
    let table_tag = 1 + (n / 300) as u64;
    surfaces.capability = Capability::Ready;
    surfaces.surfaces = vec![
        grid_surface(1, Vec3::new(0.0, FLOOR_Y, 0.0), 6.0, 40, 1),
        box_surface(2, Vec3::new(0.8, FLOOR_Y + 0.375, -2.0), Vec3::new(0.6, 0.375, 0.4), table_tag, Some("table")),
        box_surface(3, Vec3::new(0.0, 0.0, -3.5), Vec3::new(3.0, 1.5, 0.05), 1, Some("wall")),
    ];

    viewer.0 = Some(Pose::from_position(Vec3::ZERO));
    let aim = Quat::from_rotation_x(-0.2);
    hands.right = Some(Pose::new(Vec3::new(0.2, -0.3, -0.3), aim));
    hands.left = Some(Pose::new(Vec3::new(-0.2, -0.3, -0.3), aim));

    match n {
        2 => {
            selects.write(SelectStart {
                hand: Handedness::Right,
            });
        }
        4 => {
            selects.write(SelectStart {
                hand: Handedness::Left,
            });
        }
        n if n > 10 && n % 10 == 0 => {
            selects.write(SelectStart {
                hand: Handedness::Right,
            });
        }
        _ => {}
    }
}
