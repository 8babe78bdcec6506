//! Floor anchor — one-shot фиксация высоты пола
//!
//! State machine: `Unset → Locked { height }`.
//! - Переход ровно один раз за сессию (повторный lock = no-op)
//! - На переходе: ground collider едет на новую высоту, debug grid следует
//!   за ним через visual sync, уходит `FloorLocked` (подтверждение для UI)
//! - Без hit-test пол фиксируется на default высоте (`lock_default`)
//! - Обратно в `Unset` только при teardown сессии

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::collision_groups;
use crate::config::SandboxConfig;
use crate::logger;
use crate::visual_sync::{spawn_paired_visual, DebugVisible, VisualShape};
use crate::xr::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FloorState {
    #[default]
    Unset,
    Locked {
        height: f32,
    },
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FloorAnchor {
    pub state: FloorState,
    pub default_height: f32,
}

impl Default for FloorAnchor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FLOOR_HEIGHT)
    }
}

impl FloorAnchor {
    pub fn new(default_height: f32) -> Self {
        Self {
            state: FloorState::Unset,
            default_height,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, FloorState::Locked { .. })
    }

    /// Текущая высота пола (default, пока не зафиксирована)
    pub fn height(&self) -> f32 {
        match self.state {
            FloorState::Unset => self.default_height,
            FloorState::Locked { height } => height,
        }
    }

    /// Попытка зафиксировать пол по кандидату.
    ///
    /// Возвращает `Some(height)` только на реальном переходе `Unset → Locked`.
    pub fn try_lock(&mut self, candidate: Option<Pose>) -> Option<f32> {
        if self.is_locked() {
            return None;
        }
        let pose = candidate?;
        let height = pose.position.y;
        self.state = FloorState::Locked { height };
        Some(height)
    }

    /// Фиксация на default высоте (hit-test недоступен, кандидатов не будет)
    pub fn lock_default(&mut self) -> Option<f32> {
        if self.is_locked() {
            return None;
        }
        let height = self.default_height;
        self.state = FloorState::Locked { height };
        Some(height)
    }

    /// Teardown сессии
    pub fn reset(&mut self) {
        self.state = FloorState::Unset;
    }
}

/// Маркер: static ground collider
#[derive(Component, Debug)]
pub struct GroundCollider;

/// Маркер: debug grid (visual ground collider)
#[derive(Component, Debug)]
pub struct DebugGrid;

/// Event: пол зафиксирован (подтверждение для UI/hint)
#[derive(Event, Debug, Clone, Copy)]
pub struct FloorLocked {
    pub height: f32,
}

/// Система (Startup): ground collider на default высоте + debug grid
pub fn spawn_ground(mut commands: Commands, config: Res<SandboxConfig>, anchor: Res<FloorAnchor>) {
    let floor = config.floor;
    let collider = Collider::halfspace(Vec3::Y).unwrap_or_else(|| {
        Collider::cuboid(floor.ground_half_extent, floor.ground_thickness * 0.5, floor.ground_half_extent)
    });
    let transform = Transform::from_xyz(0.0, anchor.height(), 0.0);

    let ground = commands
        .spawn((
            GroundCollider,
            RigidBody::Fixed,
            collider,
            collision_groups::environment_groups(),
            transform,
        ))
        .id();

    let grid = spawn_paired_visual(
        &mut commands,
        ground,
        VisualShape::Grid {
            half_extent: floor.ground_half_extent,
        },
        transform,
    );
    commands.entity(grid).insert((DebugGrid, DebugVisible(true)));

    logger::log(&format!("Ground collider spawned at y={:.3}", anchor.height()));
}

/// Система: держит ground collider на `FloorAnchor::height()`
///
/// Срабатывает при lock и при reset (teardown возвращает пол на default).
pub fn apply_floor_height(
    anchor: Res<FloorAnchor>,
    mut ground: Query<&mut Transform, With<GroundCollider>>,
) {
    if !anchor.is_changed() {
        return;
    }
    let height = anchor.height();
    for mut transform in ground.iter_mut() {
        if transform.translation.y != height {
            transform.translation.y = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_once() {
        let mut anchor = FloorAnchor::new(0.0);
        let candidate = Some(Pose::from_position(Vec3::new(0.0, -1.2, 0.0)));

        assert_eq!(anchor.try_lock(candidate), Some(-1.2));
        assert!(anchor.is_locked());
        assert_eq!(anchor.height(), -1.2);

        // Второй lock с другим кандидатом — no-op
        let other = Some(Pose::from_position(Vec3::new(0.0, 3.0, 0.0)));
        assert_eq!(anchor.try_lock(other), None);
        assert_eq!(anchor.height(), -1.2);
    }

    #[test]
    fn test_no_lock_without_candidate() {
        let mut anchor = FloorAnchor::new(0.25);
        assert_eq!(anchor.try_lock(None), None);
        assert_eq!(anchor.state, FloorState::Unset);
        assert_eq!(anchor.height(), 0.25);
    }

    #[test]
    fn test_reset_returns_to_default() {
        let mut anchor = FloorAnchor::new(0.0);
        anchor.try_lock(Some(Pose::from_position(Vec3::Y)));
        anchor.reset();
        assert!(!anchor.is_locked());
        assert_eq!(anchor.height(), 0.0);

        // После reset снова можно зафиксировать
        assert_eq!(anchor.try_lock(Some(Pose::from_position(Vec3::Y * 2.0))), Some(2.0));
    }

    #[test]
    fn test_lock_default_is_one_shot() {
        let mut anchor = FloorAnchor::new(-0.5);
        assert_eq!(anchor.lock_default(), Some(-0.5));
        assert_eq!(anchor.state, FloorState::Locked { height: -0.5 });

        // Уже зафиксирован — ни default, ни кандидат не двигают пол
        assert_eq!(anchor.lock_default(), None);
        assert_eq!(anchor.try_lock(Some(Pose::from_position(Vec3::Y))), None);
        assert_eq!(anchor.height(), -0.5);
    }
}
