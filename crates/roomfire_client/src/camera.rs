use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

/// Эмуляция головы: mouse look (правая кнопка) + WASD/QE ходьба
pub struct HeadsetCameraPlugin;

impl Plugin for HeadsetCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (headset_look_controls, headset_walk_controls, update_camera_transform).chain());
    }
}

#[derive(Component)]
pub struct HeadsetCamera {
    pub position: Vec3,
    pub yaw: f32,   // Horizontal rotation (radians)
    pub pitch: f32, // Vertical rotation (radians)
    pub sensitivity: f32,
    pub walk_speed: f32,
}

impl Default for HeadsetCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: -0.35, // Слегка вниз, на пол и стол
            sensitivity: 0.004,
            walk_speed: 1.5,
        }
    }
}

impl HeadsetCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

fn headset_look_controls(
    mut query: Query<&mut HeadsetCamera>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
) {
    let Ok(mut camera) = query.single_mut() else {
        return;
    };

    if !mouse_buttons.pressed(MouseButton::Right) {
        // Consume motion events even when not looking around
        mouse_motion.clear();
        return;
    }

    for motion in mouse_motion.read() {
        camera.yaw -= motion.delta.x * camera.sensitivity;
        camera.pitch -= motion.delta.y * camera.sensitivity;

        // Clamp pitch: голову за спину не закидываем
        camera.pitch = camera.pitch.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.1,
            std::f32::consts::FRAC_PI_2 - 0.1,
        );
    }
}

fn headset_walk_controls(
    mut query: Query<&mut HeadsetCamera>,
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera) = query.single_mut() else {
        return;
    };

    // Ходьба в горизонтальной плоскости (как в комнате)
    let yaw = Quat::from_rotation_y(camera.yaw);
    let forward = yaw * Vec3::NEG_Z;
    let right = yaw * Vec3::X;

    let mut step = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        step += forward;
    }
    if keys.pressed(KeyCode::KeyS) {
        step -= forward;
    }
    if keys.pressed(KeyCode::KeyD) {
        step += right;
    }
    if keys.pressed(KeyCode::KeyA) {
        step -= right;
    }
    if keys.pressed(KeyCode::KeyE) {
        step += Vec3::Y;
    }
    if keys.pressed(KeyCode::KeyQ) {
        step -= Vec3::Y;
    }

    if step != Vec3::ZERO {
        let speed = camera.walk_speed;
        camera.position += step.normalize() * speed * time.delta_secs();
    }
}

fn update_camera_transform(mut query: Query<(&HeadsetCamera, &mut Transform), Changed<HeadsetCamera>>) {
    for (camera, mut transform) in query.iter_mut() {
        *transform = Transform::from_translation(camera.position).with_rotation(camera.rotation());
    }
}
