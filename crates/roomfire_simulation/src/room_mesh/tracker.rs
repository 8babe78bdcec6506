//! RoomMeshTracker — detected surfaces → static colliders
//!
//! Проход за кадр:
//! 1. Garbage collection: tracked surfaces, которых нет в текущем списке, удаляются
//! 2. Label allow-list
//! 3. Distance culling: `|origin - viewer| - radius > max_distance` ⇒ skip/teardown
//!    (до count cap: tracked surface вне дистанции удаляется в любой позиции списка)
//! 4. Count cap: после `max_surfaces` активных surfaces остальные не строим
//! 5. Change detection: строго больший tag ⇒ старый shape удаляется, строится новый
//!
//! Shapes immutable: никаких правок collider на месте, только despawn + spawn.
//! Ошибка постройки одного shape не валит пачку.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::shape::{bounding_radius, build_collider, prepare_mesh, PreparedMesh, ShapeBuildError};
use crate::collision_groups;
use crate::config::RoomMeshConfig;
use crate::logger;
use crate::visual_sync::{despawn_pair, spawn_paired_visual, DebugVisible, VisualShape};
use crate::xr::DetectedSurface;

/// Стабильный id surface, выданный при первом наблюдении runtime handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// handle runtime → SurfaceId
#[derive(Debug, Default)]
pub struct SurfaceIdAllocator {
    by_handle: HashMap<u64, SurfaceId>,
    next: u64,
}

impl SurfaceIdAllocator {
    pub fn resolve(&mut self, handle: u64) -> SurfaceId {
        if let Some(id) = self.by_handle.get(&handle) {
            return *id;
        }
        let id = SurfaceId(self.next);
        self.next += 1;
        self.by_handle.insert(handle, id);
        id
    }

    pub fn get(&self, handle: u64) -> Option<SurfaceId> {
        self.by_handle.get(&handle).copied()
    }

    /// Забываем все handles, кроме `keep`. Возвращает освобождённые ids.
    fn retain(&mut self, keep: &HashSet<u64>) -> Vec<SurfaceId> {
        let mut released = Vec::new();
        self.by_handle.retain(|handle, id| {
            let alive = keep.contains(handle);
            if !alive {
                released.push(*id);
            }
            alive
        });
        released
    }

    pub fn clear(&mut self) {
        self.by_handle.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedRoomSurface {
    pub body: Entity,
    pub debug_visual: Option<Entity>,
    pub last_changed: u64,
    pub radius: f32,
}

/// Маркер: body room-mesh collider
#[derive(Component, Debug, Clone, Copy)]
pub struct RoomMeshCollider {
    pub id: SurfaceId,
}

/// Маркер: debug-визуал room-mesh collider
#[derive(Component, Debug, Clone, Copy)]
pub struct RoomMeshDebugVisual;

/// Итоги одного прохода tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomMeshReport {
    pub built: usize,
    pub rebuilt: usize,
    pub unchanged: usize,
    pub torn_down: usize,
    pub culled: usize,
    pub filtered: usize,
    pub over_cap: usize,
    pub failed: usize,
}

#[derive(Resource, Debug, Default)]
pub struct RoomMeshTracker {
    ids: SurfaceIdAllocator,
    tracked: HashMap<SurfaceId, TrackedRoomSurface>,
    /// Bounding radius + tag, на котором он посчитан (пересчёт только при новом tag)
    radius_cache: HashMap<SurfaceId, (f32, u64)>,
    frame_counter: u32,
}

impl RoomMeshTracker {
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn get(&self, id: SurfaceId) -> Option<&TrackedRoomSurface> {
        self.tracked.get(&id)
    }

    pub fn id_for_handle(&self, handle: u64) -> Option<SurfaceId> {
        self.ids.get(handle)
    }

    pub fn tracked(&self) -> impl Iterator<Item = (&SurfaceId, &TrackedRoomSurface)> {
        self.tracked.iter()
    }

    /// Update-rate divisor: true на каждом `divisor`-м вызове
    pub fn should_update(&mut self, divisor: u32) -> bool {
        let divisor = divisor.max(1);
        self.frame_counter = (self.frame_counter + 1) % divisor;
        self.frame_counter == 0
    }

    pub fn update(
        &mut self,
        commands: &mut Commands,
        surfaces: &[DetectedSurface],
        viewer: Vec3,
        config: &RoomMeshConfig,
        debug_visible: bool,
    ) -> RoomMeshReport {
        let mut report = RoomMeshReport::default();

        let present: HashSet<u64> = surfaces
            .iter()
            .filter(|s| config.accepts_label(s.label.as_deref()))
            .map(|s| s.handle)
            .collect();
        self.collect_garbage(commands, &present, &mut report);

        let mut active = 0usize;
        for surface in surfaces {
            if !config.accepts_label(surface.label.as_deref()) {
                report.filtered += 1;
                continue;
            }
            let id = self.ids.resolve(surface.handle);
            let radius = self.cached_radius(id, surface);

            let distance = surface.pose.position.distance(viewer) - radius;
            if distance > config.max_distance {
                if self.remove(commands, id) {
                    report.torn_down += 1;
                    logger::log(&format!(
                        "Room surface {:?} out of range ({:.2}m), torn down",
                        id, distance
                    ));
                }
                report.culled += 1;
                continue;
            }
            if active >= config.max_surfaces {
                report.over_cap += 1;
                continue;
            }
            active += 1;

            match self.tracked.get(&id).copied() {
                Some(existing) if surface.last_changed <= existing.last_changed => {
                    report.unchanged += 1;
                }
                Some(existing) => match self.spawn_surface(commands, id, surface, config, debug_visible) {
                    Ok(fresh) => {
                        despawn_pair(commands, existing.body, existing.debug_visual);
                        self.tracked.insert(id, fresh);
                        self.radius_cache.insert(id, (fresh.radius, fresh.last_changed));
                        report.rebuilt += 1;
                        logger::log(&format!(
                            "Room surface {:?} rebuilt (tag {} → {})",
                            id, existing.last_changed, surface.last_changed
                        ));
                    }
                    Err(err) => {
                        report.failed += 1;
                        logger::log_warning(&format!(
                            "Room surface {:?} rebuild skipped: {}",
                            id, err
                        ));
                    }
                },
                None => match self.spawn_surface(commands, id, surface, config, debug_visible) {
                    Ok(fresh) => {
                        self.tracked.insert(id, fresh);
                        report.built += 1;
                        logger::log(&format!(
                            "Room surface {:?} tracked ({} tris, label {:?})",
                            id,
                            surface.triangle_count(),
                            surface.label
                        ));
                    }
                    Err(err) => {
                        report.failed += 1;
                        logger::log_warning(&format!("Room surface {:?} skipped: {}", id, err));
                    }
                },
            }
        }

        report
    }

    /// Teardown всех surfaces (конец сессии). Возвращает сколько удалено.
    pub fn teardown_all(&mut self, commands: &mut Commands) -> usize {
        let count = self.tracked.len();
        for (_, surface) in self.tracked.drain() {
            despawn_pair(commands, surface.body, surface.debug_visual);
        }
        self.radius_cache.clear();
        self.ids.clear();
        self.frame_counter = 0;
        count
    }

    fn collect_garbage(
        &mut self,
        commands: &mut Commands,
        present: &HashSet<u64>,
        report: &mut RoomMeshReport,
    ) {
        for id in self.ids.retain(present) {
            self.radius_cache.remove(&id);
            if self.remove(commands, id) {
                report.torn_down += 1;
                logger::log(&format!("Room surface {:?} no longer reported, torn down", id));
            }
        }
    }

    fn remove(&mut self, commands: &mut Commands, id: SurfaceId) -> bool {
        match self.tracked.remove(&id) {
            Some(surface) => {
                despawn_pair(commands, surface.body, surface.debug_visual);
                true
            }
            None => false,
        }
    }

    /// Radius из кэша; строго новый tag геометрии ⇒ пересчёт (в т.ч. для culled surfaces)
    fn cached_radius(&mut self, id: SurfaceId, surface: &DetectedSurface) -> f32 {
        match self.radius_cache.get(&id) {
            Some(&(radius, tag)) if surface.last_changed <= tag => radius,
            _ => {
                let radius = bounding_radius(&surface.vertices);
                self.radius_cache.insert(id, (radius, surface.last_changed));
                radius
            }
        }
    }

    fn spawn_surface(
        &self,
        commands: &mut Commands,
        id: SurfaceId,
        surface: &DetectedSurface,
        config: &RoomMeshConfig,
        debug_visible: bool,
    ) -> Result<TrackedRoomSurface, ShapeBuildError> {
        let mesh = prepare_mesh(&surface.vertices, &surface.indices, config.max_triangles)?;
        let collider = build_collider(&mesh)?;
        if mesh.triangles.len() < mesh.source_triangles {
            logger::log(&format!(
                "Room surface {:?} subsampled {} → {} tris",
                id,
                mesh.source_triangles,
                mesh.triangles.len()
            ));
        }

        let transform = surface.pose.to_transform();
        let body = commands
            .spawn((
                RoomMeshCollider { id },
                RigidBody::Fixed,
                collider,
                collision_groups::environment_groups(),
                transform,
            ))
            .id();

        let debug_visual = config
            .debug_visuals
            .then(|| spawn_debug_visual(commands, body, mesh, transform, debug_visible));

        Ok(TrackedRoomSurface {
            body,
            debug_visual,
            last_changed: surface.last_changed,
            radius: bounding_radius(&surface.vertices),
        })
    }
}

fn spawn_debug_visual(
    commands: &mut Commands,
    body: Entity,
    mesh: PreparedMesh,
    transform: Transform,
    visible: bool,
) -> Entity {
    let visual = spawn_paired_visual(
        commands,
        body,
        VisualShape::TriMesh {
            vertices: mesh.vertices,
            indices: mesh.triangles,
        },
        transform,
    );
    commands
        .entity(visual)
        .insert((RoomMeshDebugVisual, DebugVisible(visible)));
    visual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::Pose;
    use bevy::ecs::world::CommandQueue;

    fn surface(handle: u64, at: Vec3, tag: u64) -> DetectedSurface {
        DetectedSurface {
            handle,
            pose: Pose::from_position(at),
            vertices: vec![
                Vec3::new(-0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(-0.5, 0.0, 0.5),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            label: Some("table".into()),
            last_changed: tag,
        }
    }

    fn run(
        tracker: &mut RoomMeshTracker,
        world: &mut World,
        surfaces: &[DetectedSurface],
        config: &RoomMeshConfig,
    ) -> RoomMeshReport {
        let mut queue = CommandQueue::default();
        let report = {
            let mut commands = Commands::new(&mut queue, world);
            tracker.update(&mut commands, surfaces, Vec3::ZERO, config, true)
        };
        queue.apply(world);
        report
    }

    fn collider_count(world: &mut World) -> usize {
        world
            .query_filtered::<Entity, With<RoomMeshCollider>>()
            .iter(world)
            .count()
    }

    #[test]
    fn test_same_tag_is_not_rebuilt() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        let first = run(&mut tracker, &mut world, &[surface(7, Vec3::Z, 5)], &config);
        assert_eq!(first.built, 1);
        let id = tracker.id_for_handle(7).expect("id assigned");
        let body = tracker.get(id).map(|s| s.body);

        let second = run(&mut tracker, &mut world, &[surface(7, Vec3::Z, 5)], &config);
        assert_eq!(second.rebuilt, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(tracker.get(id).map(|s| s.body), body);
        assert_eq!(collider_count(&mut world), 1);
    }

    #[test]
    fn test_newer_tag_replaces_shape() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        run(&mut tracker, &mut world, &[surface(7, Vec3::Z, 5)], &config);
        let id = tracker.id_for_handle(7).expect("id assigned");
        let old = *tracker.get(id).expect("tracked");

        let report = run(&mut tracker, &mut world, &[surface(7, Vec3::Z, 6)], &config);
        assert_eq!(report.rebuilt, 1);

        let new = *tracker.get(id).expect("still tracked");
        assert_ne!(new.body, old.body);
        assert_eq!(new.last_changed, 6);
        assert!(world.get_entity(old.body).is_err());
        assert!(old.debug_visual.map(|v| world.get_entity(v).is_err()).unwrap_or(true));
        assert_eq!(collider_count(&mut world), 1);
    }

    #[test]
    fn test_absent_surface_removed_exactly_once() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        run(
            &mut tracker,
            &mut world,
            &[surface(1, Vec3::Z, 1), surface(2, Vec3::X, 1)],
            &config,
        );
        assert_eq!(collider_count(&mut world), 2);

        let first_absent = run(&mut tracker, &mut world, &[surface(2, Vec3::X, 1)], &config);
        let second_absent = run(&mut tracker, &mut world, &[surface(2, Vec3::X, 1)], &config);

        assert_eq!(first_absent.torn_down, 1);
        assert_eq!(second_absent.torn_down, 0);
        assert_eq!(tracker.len(), 1);
        assert_eq!(collider_count(&mut world), 1);
    }

    #[test]
    fn test_distance_cull_with_radius() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig {
            max_distance: 6.5,
            ..default()
        };

        // radius 2м: вершины на расстоянии 2 от origin
        let mut far = surface(3, Vec3::new(10.0, 0.0, 0.0), 1);
        far.vertices = vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)];
        far.indices = vec![0, 1, 2];

        let report = run(&mut tracker, &mut world, &[far.clone()], &config);
        assert_eq!(report.culled, 1);
        assert_eq!(report.built, 0);
        assert!(tracker.is_empty());

        // 8м - 2м = 6м ≤ 6.5 — трекаем
        far.pose = Pose::from_position(Vec3::new(8.0, 0.0, 0.0));
        let report = run(&mut tracker, &mut world, &[far], &config);
        assert_eq!(report.built, 1);
    }

    #[test]
    fn test_tracked_surface_torn_down_when_out_of_range() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        run(&mut tracker, &mut world, &[surface(4, Vec3::Z, 1)], &config);
        assert_eq!(tracker.len(), 1);

        let report = run(&mut tracker, &mut world, &[surface(4, Vec3::Z * 20.0, 1)], &config);
        assert_eq!(report.torn_down, 1);
        assert!(tracker.is_empty());
        assert_eq!(collider_count(&mut world), 0);
    }

    #[test]
    fn test_count_cap() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig {
            max_surfaces: 3,
            ..default()
        };

        let surfaces: Vec<_> = (0..5).map(|h| surface(h, Vec3::Z, 1)).collect();
        let report = run(&mut tracker, &mut world, &surfaces, &config);

        assert_eq!(report.built, 3);
        assert_eq!(report.over_cap, 2);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_out_of_range_tracked_surface_torn_down_past_count_cap() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig {
            max_surfaces: 1,
            ..default()
        };

        run(&mut tracker, &mut world, &[surface(2, Vec3::Z, 1)], &config);
        let far_id = tracker.id_for_handle(2).expect("id assigned");

        // Новый surface занял единственный слот, старый ушёл за дистанцию
        let report = run(
            &mut tracker,
            &mut world,
            &[surface(1, Vec3::X, 1), surface(2, Vec3::Z * 20.0, 1)],
            &config,
        );
        assert_eq!(report.built, 1);
        assert_eq!(report.torn_down, 1);
        assert_eq!(report.over_cap, 0);
        assert!(tracker.get(far_id).is_none());
        assert_eq!(tracker.len(), 1);
        assert_eq!(collider_count(&mut world), 1);
    }

    #[test]
    fn test_culled_surface_radius_refreshed_on_newer_tag() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig {
            max_distance: 6.5,
            ..default()
        };

        // radius ≈ 0.71: 8 - 0.71 > 6.5 ⇒ culled
        let small = surface(5, Vec3::new(8.0, 0.0, 0.0), 1);
        assert_eq!(run(&mut tracker, &mut world, &[small.clone()], &config).culled, 1);

        // Геометрия выросла до radius 2, но tag тот же — radius из кэша
        let mut grown = small;
        grown.vertices = vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)];
        grown.indices = vec![0, 1, 2];
        assert_eq!(run(&mut tracker, &mut world, &[grown.clone()], &config).culled, 1);

        // Новый tag ⇒ radius пересчитан: 8 - 2 = 6 ≤ 6.5
        grown.last_changed = 2;
        let report = run(&mut tracker, &mut world, &[grown], &config);
        assert_eq!(report.culled, 0);
        assert_eq!(report.built, 1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_failed_surface_does_not_abort_batch() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        let mut broken = surface(10, Vec3::Z, 1);
        broken.indices = vec![0, 1, 99];

        let report = run(
            &mut tracker,
            &mut world,
            &[surface(9, Vec3::Z, 1), broken, surface(11, Vec3::X, 1)],
            &config,
        );

        assert_eq!(report.failed, 1);
        assert_eq!(report.built, 2);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_shape() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        run(&mut tracker, &mut world, &[surface(5, Vec3::Z, 1)], &config);
        let id = tracker.id_for_handle(5).expect("id");
        let before = *tracker.get(id).expect("tracked");

        let mut broken = surface(5, Vec3::Z, 2);
        broken.indices = vec![0, 1];
        let report = run(&mut tracker, &mut world, &[broken], &config);

        assert_eq!(report.failed, 1);
        assert_eq!(tracker.get(id).copied(), Some(before));
        assert!(world.get_entity(before.body).is_ok());
    }

    #[test]
    fn test_label_filter() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig {
            label_allow_list: Some(vec!["wall".into()]),
            ..default()
        };

        let mut wall = surface(1, Vec3::Z, 1);
        wall.label = Some("wall".into());
        let report = run(&mut tracker, &mut world, &[wall, surface(2, Vec3::X, 1)], &config);

        assert_eq!(report.built, 1);
        assert_eq!(report.filtered, 1);
    }

    #[test]
    fn test_teardown_all() {
        let mut world = World::new();
        let mut tracker = RoomMeshTracker::default();
        let config = RoomMeshConfig::default();

        run(
            &mut tracker,
            &mut world,
            &[surface(1, Vec3::Z, 1), surface(2, Vec3::X, 1)],
            &config,
        );

        let mut queue = CommandQueue::default();
        let removed = {
            let mut commands = Commands::new(&mut queue, &world);
            tracker.teardown_all(&mut commands)
        };
        queue.apply(&mut world);

        assert_eq!(removed, 2);
        assert!(tracker.is_empty());
        assert_eq!(collider_count(&mut world), 0);
        let visuals = world
            .query_filtered::<Entity, With<RoomMeshDebugVisual>>()
            .iter(&world)
            .count();
        assert_eq!(visuals, 0);
    }

    #[test]
    fn test_update_divisor() {
        let mut tracker = RoomMeshTracker::default();
        let fired: Vec<bool> = (0..6).map(|_| tracker.should_update(3)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
        assert!(tracker.should_update(1));
    }

    #[test]
    fn test_ids_are_stable_per_handle() {
        let mut ids = SurfaceIdAllocator::default();
        let a = ids.resolve(100);
        let b = ids.resolve(200);
        assert_ne!(a, b);
        assert_eq!(ids.resolve(100), a);
    }
}
