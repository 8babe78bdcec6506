//! XR session lifecycle
//!
//! - `SessionStarted` → session active, frame pipeline включается
//! - `SessionEnded` → синхронный teardown: room mesh colliders + debug визуалы,
//!   floor lock, кандидат позы, снаряды (никакой warm-up не сработает после).
//!   Feeds хоста сбрасываются в `Pending`, чтобы в этом же кадре никто не
//!   пересоздал состояние из устаревших данных.
//! - Недоступная capability → один `CapabilityNotice` за сессию (degrade, не ошибка);
//!   без hit-test пол фиксируется на default высоте

use bevy::prelude::*;

use crate::floor_anchor::{FloorAnchor, FloorLocked};
use crate::logger;
use crate::projectile::ProjectileManager;
use crate::room_mesh::{RoomMeshStats, RoomMeshTracker};
use crate::surface_sampler::SurfaceCandidate;
use crate::xr::{
    Capability, DetectedSurfaceFeed, HitTestFeed, SelectStart, SessionEnded, SessionStarted,
    TrackedHands, ViewerPose,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    HitTest,
    MeshDetection,
}

/// Event: capability недоступна — хост показывает сообщение
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityNotice {
    pub kind: CapabilityKind,
}

impl CapabilityNotice {
    pub fn message(&self) -> &'static str {
        match self.kind {
            CapabilityKind::HitTest => "Surface detection unavailable: floor fixed at default height",
            CapabilityKind::MeshDetection => "Room mesh unavailable: only the floor and placed surfaces collide",
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SessionState {
    pub active: bool,
    hit_test_notified: bool,
    mesh_notified: bool,
}

/// Run condition: есть активная сессия
pub fn session_active(state: Res<SessionState>) -> bool {
    state.active
}

#[allow(clippy::too_many_arguments)]
pub fn handle_session_events(
    mut commands: Commands,
    mut started: EventReader<SessionStarted>,
    mut ended: EventReader<SessionEnded>,
    mut selects: ResMut<Events<SelectStart>>,
    mut state: ResMut<SessionState>,
    mut anchor: ResMut<FloorAnchor>,
    mut candidate: ResMut<SurfaceCandidate>,
    mut tracker: ResMut<RoomMeshTracker>,
    mut stats: ResMut<RoomMeshStats>,
    mut projectiles: ResMut<ProjectileManager>,
    mut hit_test: ResMut<HitTestFeed>,
    mut surfaces: ResMut<DetectedSurfaceFeed>,
    mut viewer: ResMut<ViewerPose>,
    mut hands: ResMut<TrackedHands>,
) {
    // Порядок в одном кадре: сначала start, потом end (end побеждает)
    if started.read().count() > 0 && !state.active {
        *state = SessionState {
            active: true,
            ..default()
        };
        logger::log_info("XR session started");
    }

    if ended.read().count() == 0 || !state.active {
        return;
    }

    let surfaces_removed = tracker.teardown_all(&mut commands);
    let projectiles_removed = projectiles.clear_all(&mut commands);
    anchor.reset();
    candidate.0 = None;
    *stats = RoomMeshStats::default();

    *hit_test = HitTestFeed::default();
    *surfaces = DetectedSurfaceFeed::default();
    *viewer = ViewerPose::default();
    *hands = TrackedHands::default();
    // Select, прилетевшие в кадре окончания сессии, никуда не идут
    selects.clear();

    *state = SessionState::default();
    logger::log_info(&format!(
        "XR session ended: {} room surface(s), {} projectile(s) torn down",
        surfaces_removed, projectiles_removed
    ));
}

/// Система: один notice на недоступную capability за сессию
///
/// Без hit-test пол сразу фиксируется на default высоте (`FloorLocked` как при обычном lock).
pub fn report_capabilities(
    hit_test: Res<HitTestFeed>,
    surfaces: Res<DetectedSurfaceFeed>,
    mut state: ResMut<SessionState>,
    mut anchor: ResMut<FloorAnchor>,
    mut notices: EventWriter<CapabilityNotice>,
    mut floor_locked: EventWriter<FloorLocked>,
) {
    if hit_test.capability == Capability::Unavailable && !anchor.is_locked() {
        if let Some(height) = anchor.lock_default() {
            logger::log_info(&format!("Floor locked at default y={:.3}", height));
            floor_locked.write(FloorLocked { height });
        }
    }

    if hit_test.capability == Capability::Unavailable && !state.hit_test_notified {
        state.hit_test_notified = true;
        let notice = CapabilityNotice {
            kind: CapabilityKind::HitTest,
        };
        logger::log_warning(notice.message());
        notices.write(notice);
    }

    if surfaces.capability == Capability::Unavailable && !state.mesh_notified {
        state.mesh_notified = true;
        let notice = CapabilityNotice {
            kind: CapabilityKind::MeshDetection,
        };
        logger::log_warning(notice.message());
        notices.write(notice);
    }
}
