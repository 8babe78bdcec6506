//! Room mesh — реальная геометрия комнаты как static colliders
//!
//! Содержит:
//! - subsample: прореживание треугольников по stride
//! - shape: валидация геометрии + trimesh collider
//! - tracker: RoomMeshTracker (ids, change detection, caps, GC)

pub mod shape;
pub mod subsample;
pub mod tracker;

pub use shape::{bounding_radius, build_collider, prepare_mesh, PreparedMesh, ShapeBuildError};
pub use subsample::{subsample_triangles, triangle_stride};
pub use tracker::{
    RoomMeshCollider, RoomMeshDebugVisual, RoomMeshReport, RoomMeshTracker, SurfaceId,
    SurfaceIdAllocator, TrackedRoomSurface,
};

use bevy::prelude::*;

use crate::config::SandboxConfig;
use crate::visual_sync::DebugVisible;
use crate::xr::{DetectedSurfaceFeed, ViewerPose};

/// Последний отчёт tracker (для debug overlay хоста)
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct RoomMeshStats {
    pub last: RoomMeshReport,
    pub tracked: usize,
}

/// Видимость debug wireframe room-mesh colliders
#[derive(Resource, Debug, Clone, Copy)]
pub struct RoomMeshDebug {
    pub visible: bool,
}

impl Default for RoomMeshDebug {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// Event: переключить debug wireframe
#[derive(Event, Debug, Clone, Copy)]
pub struct ToggleRoomMeshDebug;

/// Система: прогон tracker (раз в `update_divisor` кадров)
pub fn update_room_mesh(
    mut commands: Commands,
    mut tracker: ResMut<RoomMeshTracker>,
    mut stats: ResMut<RoomMeshStats>,
    feed: Res<DetectedSurfaceFeed>,
    viewer: Res<ViewerPose>,
    debug: Res<RoomMeshDebug>,
    config: Res<SandboxConfig>,
) {
    if !feed.capability.is_ready() {
        return;
    }
    // Без позы головы нечем считать дистанцию — ждём следующий кадр
    let Some(viewer) = viewer.0 else {
        return;
    };
    if !tracker.should_update(config.room_mesh.update_divisor) {
        return;
    }

    let report = tracker.update(
        &mut commands,
        &feed.surfaces,
        viewer.position,
        &config.room_mesh,
        debug.visible,
    );
    stats.last = report;
    stats.tracked = tracker.len();
}

/// Система: toggle debug wireframe
pub fn toggle_room_mesh_debug(
    mut events: EventReader<ToggleRoomMeshDebug>,
    mut debug: ResMut<RoomMeshDebug>,
    mut visuals: Query<&mut DebugVisible, With<RoomMeshDebugVisual>>,
) {
    let toggles = events.read().count();
    if toggles % 2 == 0 {
        return;
    }

    debug.visible = !debug.visible;
    for mut visible in visuals.iter_mut() {
        visible.0 = debug.visible;
    }
}
