//! Logger integration: сбои построения shape логируются, пачка продолжается
//!
//! Отдельный test binary: глобальный sink подменяется только здесь.

use bevy::prelude::*;
use roomfire_simulation::logger::{self, LogLevel, MemoryLogger};
use roomfire_simulation::xr::synthetic::box_surface;
use roomfire_simulation::*;

#[test]
fn test_shape_failure_is_logged_and_batch_continues() {
    let capture = MemoryLogger::new();
    logger::set_logger(Box::new(capture.clone()));
    logger::set_log_level(LogLevel::Debug);

    let mut app = create_headless_app(1);
    app.update();
    app.world_mut().send_event(SessionStarted);
    app.world_mut().resource_mut::<ViewerPose>().0 = Some(Pose::from_position(Vec3::ZERO));

    let mut broken = box_surface(2, Vec3::new(0.0, 0.0, -1.0), Vec3::splat(0.2), 1, Some("table"));
    broken.indices.truncate(4);
    {
        let mut feed = app.world_mut().resource_mut::<DetectedSurfaceFeed>();
        feed.capability = Capability::Ready;
        feed.surfaces = vec![
            box_surface(1, Vec3::new(1.0, 0.0, -1.0), Vec3::splat(0.2), 1, Some("table")),
            broken,
            box_surface(3, Vec3::new(-1.0, 0.0, -1.0), Vec3::splat(0.2), 1, Some("table")),
        ];
    }

    for _ in 0..3 {
        app.update();
    }

    let stats = *app.world().resource::<RoomMeshStats>();
    assert_eq!(stats.tracked, 2);
    assert_eq!(stats.last.failed, 1);
    assert!(capture.contains(LogLevel::Warning, "not a multiple of 3"));
    assert!(capture.contains(LogLevel::Info, "XR session started"));

    // Info фильтрует debug строки
    logger::set_log_level(LogLevel::Info);
    let before = capture.lines().len();
    logger::log("debug noise");
    assert_eq!(capture.lines().len(), before);
}
