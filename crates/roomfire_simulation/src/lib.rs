//! ROOMFIRE Simulation Core
//!
//! AR песочница: пол из hit-test, ручные плоскости, room mesh как colliders,
//! шарики из руки. Headless ECS на Bevy 0.16 + Rapier компоненты.
//!
//! HOST CONTRACT:
//! - хост (XR runtime / desktop эмулятор) пишет input resources из `xr`
//! - симуляция ведёт physics entities и их visual пары
//! - хост рисует всё, у чего есть `VisualShape`
//!
//! Порядок кадра: physics step (PreUpdate) → expiry снарядов → sample позы →
//! select события → room mesh → visual sync.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod collider_placer;
pub mod collision_groups;
pub mod config;
pub mod floor_anchor;
pub mod interaction;
pub mod logger;
pub mod projectile;
pub mod room_mesh;
pub mod session;
pub mod surface_sampler;
pub mod visual_sync;
pub mod xr;

pub use collider_placer::{place_collider, PlacedCollider, PlacedSurface, PlacedSurfaces};
pub use config::SandboxConfig;
pub use floor_anchor::{DebugGrid, FloorAnchor, FloorLocked, FloorState, GroundCollider};
pub use interaction::{route_select, InteractionHint, ProjectileFired, SelectAction};
pub use projectile::{ClearProjectiles, Projectile, ProjectileBody, ProjectileManager, ProjectileVisual};
pub use room_mesh::{
    RoomMeshCollider, RoomMeshDebug, RoomMeshStats, RoomMeshTracker, ShapeBuildError, SurfaceId,
    ToggleRoomMeshDebug,
};
pub use session::{CapabilityKind, CapabilityNotice, SessionState};
pub use surface_sampler::SurfaceCandidate;
pub use visual_sync::{DebugVisible, HasVisual, VisualOf, VisualShape};
pub use xr::{
    Capability, DetectedSurface, DetectedSurfaceFeed, Handedness, HitTestFeed, Pose, SelectStart,
    SessionEnded, SessionStarted, TrackedHands, ViewerPose,
};

/// Длительность кадра headset (72Hz) — и шаг физики, и шаг headless времени
pub const FRAME_DT: f32 = 1.0 / 72.0;

/// Фаза кадра песочницы (хост может ставить свои системы до/после)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxFrameSet;

/// Главный plugin песочницы (без physics step — см. `SandboxPhysicsPlugin`)
pub struct SandboxPlugin;

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        use session::session_active;

        app.init_resource::<SandboxConfig>();
        let default_height = app.world().resource::<SandboxConfig>().floor.default_height;

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Input (пишет хост)
            .init_resource::<HitTestFeed>()
            .init_resource::<DetectedSurfaceFeed>()
            .init_resource::<ViewerPose>()
            .init_resource::<TrackedHands>()
            // State песочницы
            .insert_resource(FloorAnchor::new(default_height))
            .init_resource::<SessionState>()
            .init_resource::<SurfaceCandidate>()
            .init_resource::<PlacedSurfaces>()
            .init_resource::<ProjectileManager>()
            .init_resource::<RoomMeshTracker>()
            .init_resource::<RoomMeshStats>()
            .init_resource::<RoomMeshDebug>()
            .init_resource::<InteractionHint>()
            // События
            .add_event::<SelectStart>()
            .add_event::<SessionStarted>()
            .add_event::<SessionEnded>()
            .add_event::<ClearProjectiles>()
            .add_event::<ToggleRoomMeshDebug>()
            .add_event::<FloorLocked>()
            .add_event::<ProjectileFired>()
            .add_event::<CapabilityNotice>()
            .add_systems(Startup, floor_anchor::spawn_ground)
            .add_systems(
                Update,
                (
                    session::handle_session_events,
                    session::report_capabilities.run_if(session_active),
                    projectile::tick_projectiles.run_if(session_active),
                    projectile::clear_projectiles_on_request,
                    surface_sampler::sample_surface.run_if(session_active),
                    interaction::route_select_events.run_if(session_active),
                    floor_anchor::apply_floor_height,
                    room_mesh::update_room_mesh.run_if(session_active),
                    room_mesh::toggle_room_mesh_debug,
                    visual_sync::sync_visual_transforms,
                    visual_sync::despawn_orphan_visuals,
                    interaction::update_interaction_hint,
                )
                    .chain() // Последовательное выполнение, один поток состояния
                    .in_set(SandboxFrameSet),
            );
    }
}

/// Rapier step в PreUpdate: к моменту Update transforms уже после шага.
///
/// Fixed dt = один кадр headset, один substep.
pub struct SandboxPhysicsPlugin;

impl Plugin for SandboxPhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(TimestepMode::Fixed {
            dt: FRAME_DT,
            substeps: 1,
        })
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_schedule(PreUpdate));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Minimal Bevy App для headless прогона (без физики и рендера)
///
/// Время двигается ровно на `FRAME_DT` за `app.update()`.
pub fn create_headless_app(seed: u64) -> App {
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME_DT)))
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SandboxPlugin);

    app
}

/// Snapshot снарядов для сравнения детерминизма: serial + velocity + позиция
pub fn projectile_snapshot(world: &mut World) -> Vec<u8> {
    let mut query = world.query::<(&ProjectileBody, &Velocity, &Transform)>();
    let mut rows: Vec<_> = query
        .iter(world)
        .map(|(body, velocity, transform)| (body.serial, *velocity, transform.translation))
        .collect();

    rows.sort_by_key(|(serial, _, _)| *serial);

    let mut snapshot = Vec::new();
    for (serial, velocity, position) in rows {
        snapshot.extend_from_slice(&serial.to_le_bytes());
        for v in [velocity.linvel, velocity.angvel, position] {
            for c in v.to_array() {
                snapshot.extend_from_slice(&c.to_le_bytes());
            }
        }
    }

    snapshot
}
