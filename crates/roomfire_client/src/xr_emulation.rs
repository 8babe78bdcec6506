//! Desktop эмуляция XR runtime
//!
//! Виртуальная "реальная" комната (пол, стол, стена), hit-test лучом из курсора,
//! контроллеры привязаны к камере. Всё пишется в input resources симуляции
//! ДО `SandboxFrameSet`.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use roomfire_simulation::xr::synthetic::{box_surface, grid_surface};
use roomfire_simulation::{
    Capability, ClearProjectiles, DetectedSurfaceFeed, Handedness, HitTestFeed, Pose, SandboxFrameSet, SelectStart,
    SessionEnded, SessionStarted, ToggleRoomMeshDebug, TrackedHands, ViewerPose,
};

use crate::camera::HeadsetCamera;

pub struct XrEmulationPlugin;

impl Plugin for XrEmulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EmulatedRoom>()
            .add_systems(Startup, (spawn_physical_room, start_session))
            .add_systems(
                Update,
                (emulate_tracking, emulate_room_detection, emulate_controller_input)
                    .chain()
                    .before(SandboxFrameSet),
            );
    }
}

/// "Физическая" комната, которую видит эмулированный runtime
#[derive(Resource, Debug, Clone)]
pub struct EmulatedRoom {
    pub floor_y: f32,
    pub table_center: Vec3,
    pub table_half_extents: Vec3,
    pub wall_center: Vec3,
    pub wall_half_extents: Vec3,
    pub hit_test_enabled: bool,
    /// Период "уточнения" геометрии стола runtime'ом (секунды)
    pub refine_period: f32,
}

impl Default for EmulatedRoom {
    fn default() -> Self {
        let floor_y = -1.5;
        Self {
            floor_y,
            table_center: Vec3::new(0.6, floor_y + 0.375, -1.8),
            table_half_extents: Vec3::new(0.6, 0.375, 0.4),
            wall_center: Vec3::new(0.0, floor_y + 1.5, -3.5),
            wall_half_extents: Vec3::new(3.0, 1.5, 0.05),
            hit_test_enabled: true,
            refine_period: 5.0,
        }
    }
}

impl EmulatedRoom {
    /// Hit-test луча против пола и крышки стола, ближайший первым
    pub fn hit_test(&self, ray: Ray3d) -> Vec<Pose> {
        let mut hits: Vec<(f32, Vec3)> = Vec::new();

        if let Some(t) = ray.intersect_plane(Vec3::Y * self.floor_y, InfinitePlane3d::new(Vec3::Y)) {
            hits.push((t, ray.get_point(t)));
        }

        let table_top = self.table_center + Vec3::Y * self.table_half_extents.y;
        if let Some(t) = ray.intersect_plane(table_top, InfinitePlane3d::new(Vec3::Y)) {
            let point = ray.get_point(t);
            let local = point - table_top;
            if local.x.abs() <= self.table_half_extents.x && local.z.abs() <= self.table_half_extents.z {
                hits.push((t, point));
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, point)| Pose::from_position(point)).collect()
    }
}

/// Полупрозрачная "реальность" — чтобы было видно, что детектит runtime
fn spawn_physical_room(
    mut commands: Commands,
    room: Res<EmulatedRoom>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.5, 0.5, 0.55, 0.5),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(6.0)))),
        MeshMaterial3d(material.clone()),
        Transform::from_xyz(0.0, room.floor_y - 0.001, 0.0),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(room.table_half_extents * 2.0))),
        MeshMaterial3d(material.clone()),
        Transform::from_translation(room.table_center),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(room.wall_half_extents * 2.0))),
        MeshMaterial3d(material),
        Transform::from_translation(room.wall_center),
    ));
}

/// Сессия стартует сразу (desktop — "шлем уже надет")
fn start_session(mut started: EventWriter<SessionStarted>) {
    started.write(SessionStarted);
}

/// Viewer = камера, руки = смещения от камеры, прицел по лучу курсора
fn emulate_tracking(
    room: Res<EmulatedRoom>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<HeadsetCamera>>,
    mut viewer: ResMut<ViewerPose>,
    mut hands: ResMut<TrackedHands>,
    mut hit_test: ResMut<HitTestFeed>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let head = camera_transform.compute_transform();
    viewer.0 = Some(Pose::new(head.translation, head.rotation));

    let ray = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .and_then(|cursor| camera.viewport_to_world(camera_transform, cursor).ok());

    // Без курсора контроллеры смотрят туда же, куда голова
    let aim = ray
        .map(|ray| Transform::default().looking_to(ray.direction, Dir3::Y).rotation)
        .unwrap_or(head.rotation);
    hands.right = Some(Pose::new(head.transform_point(Vec3::new(0.2, -0.25, -0.3)), aim));
    hands.left = Some(Pose::new(head.transform_point(Vec3::new(-0.2, -0.25, -0.3)), aim));

    if room.hit_test_enabled {
        hit_test.capability = Capability::Ready;
        hit_test.hits = ray.map(|ray| room.hit_test(ray)).unwrap_or_default();
    } else {
        hit_test.capability = Capability::Unavailable;
        hit_test.hits.clear();
    }
}

/// Mesh detection: пол-сетка, стол (tag растёт каждые `refine_period`), стена
fn emulate_room_detection(room: Res<EmulatedRoom>, time: Res<Time>, mut feed: ResMut<DetectedSurfaceFeed>) {
    let table_tag = 1 + (time.elapsed_secs() / room.refine_period.max(0.1)) as u64;

    feed.capability = Capability::Ready;
    feed.surfaces = vec![
        grid_surface(1, Vec3::new(0.0, room.floor_y, 0.0), 6.0, 24, 1),
        box_surface(2, room.table_center, room.table_half_extents, table_tag, Some("table")),
        box_surface(3, room.wall_center, room.wall_half_extents, 1, Some("wall")),
    ];
}

/// Мышь/клавиатура → select и session события
#[allow(clippy::too_many_arguments)]
fn emulate_controller_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut room: ResMut<EmulatedRoom>,
    mut selects: EventWriter<SelectStart>,
    mut started: EventWriter<SessionStarted>,
    mut ended: EventWriter<SessionEnded>,
    mut clear: EventWriter<ClearProjectiles>,
    mut toggle_debug: EventWriter<ToggleRoomMeshDebug>,
) {
    if mouse_buttons.just_pressed(MouseButton::Left) {
        let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
        let hand = if shift { Handedness::Left } else { Handedness::Right };
        selects.write(SelectStart { hand });
    }

    if keys.just_pressed(KeyCode::F1) {
        started.write(SessionStarted);
    }
    if keys.just_pressed(KeyCode::F2) {
        ended.write(SessionEnded);
    }
    if keys.just_pressed(KeyCode::KeyC) {
        clear.write(ClearProjectiles);
    }
    if keys.just_pressed(KeyCode::KeyM) {
        toggle_debug.write(ToggleRoomMeshDebug);
    }
    if keys.just_pressed(KeyCode::KeyH) {
        room.hit_test_enabled = !room.hit_test_enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_prefers_table_top_over_floor() {
        let room = EmulatedRoom::default();
        let top = room.table_center + Vec3::Y * room.table_half_extents.y;
        let ray = Ray3d::new(top + Vec3::Y * 1.0, Dir3::NEG_Y);

        let hits = room.hit_test(ray);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].position.y - top.y).abs() < 1e-5);
        assert!((hits[1].position.y - room.floor_y).abs() < 1e-5);
    }

    #[test]
    fn test_hit_test_misses_when_looking_up() {
        let room = EmulatedRoom::default();
        assert!(room.hit_test(Ray3d::new(Vec3::ZERO, Dir3::Y)).is_empty());
    }
}
