//! Константы и конфиг песочницы
//!
//! Все значения compile-time (`const`). `SandboxConfig` — resource, собранный из них
//! по умолчанию; тесты подменяют отдельные поля (маленькие капы и т.п.).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::xr::Handedness;

// ============================================================================
// Projectiles
// ============================================================================

/// Радиус шарика (м)
pub const PROJECTILE_RADIUS: f32 = 0.04;
/// Масса шарика (кг)
pub const PROJECTILE_MASS: f32 = 0.05;
/// Начальная скорость (м/с)
pub const PROJECTILE_SPEED: f32 = 6.0;
/// Hard cap на количество живых снарядов
pub const PROJECTILE_CAP: usize = 200;
/// Время жизни (сек)
pub const PROJECTILE_LIFETIME_SECS: f64 = 10.0;
/// Сколько после spawn снаряд летит без contact response (сек)
pub const PROJECTILE_WARMUP_SECS: f64 = 0.05;
/// Максимальная |angvel| по каждой оси при spawn (рад/с)
pub const PROJECTILE_MAX_TUMBLE: f32 = 4.0;
pub const PROJECTILE_RESTITUTION: f32 = 0.6;
pub const PROJECTILE_FRICTION: f32 = 0.4;

// ============================================================================
// Room mesh
// ============================================================================

/// Максимум активных room-mesh surfaces за один проход
pub const ROOM_MESH_MAX_SURFACES: usize = 30;
/// Выше этого числа треугольников surface прореживается
pub const ROOM_MESH_MAX_TRIANGLES: usize = 2000;
/// |origin - viewer| - radius > этого ⇒ surface не трекается (м)
pub const ROOM_MESH_MAX_DISTANCE: f32 = 6.5;
/// Tracker обновляется каждый N-й кадр
pub const ROOM_MESH_UPDATE_DIVISOR: u32 = 3;

// ============================================================================
// Placement / floor
// ============================================================================

pub const PLACED_COLLIDER_WIDTH: f32 = 1.0;
pub const PLACED_COLLIDER_HEIGHT: f32 = 1.0;
pub const PLACED_COLLIDER_THICKNESS: f32 = 0.02;
/// Прозрачность визуала размещённой плоскости
pub const PLACED_VISUAL_ALPHA: f32 = 0.35;

/// Высота пола, пока пользователь её не зафиксировал (или hit-test недоступен)
pub const DEFAULT_FLOOR_HEIGHT: f32 = 0.0;
/// Полуразмер ground collider по X/Z (м)
pub const GROUND_HALF_EXTENT: f32 = 25.0;
pub const GROUND_THICKNESS: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    pub radius: f32,
    pub mass: f32,
    pub speed: f32,
    pub capacity: usize,
    pub lifetime_secs: f64,
    pub warmup_secs: f64,
    pub max_tumble: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            radius: PROJECTILE_RADIUS,
            mass: PROJECTILE_MASS,
            speed: PROJECTILE_SPEED,
            capacity: PROJECTILE_CAP,
            lifetime_secs: PROJECTILE_LIFETIME_SECS,
            warmup_secs: PROJECTILE_WARMUP_SECS,
            max_tumble: PROJECTILE_MAX_TUMBLE,
            restitution: PROJECTILE_RESTITUTION,
            friction: PROJECTILE_FRICTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMeshConfig {
    pub max_surfaces: usize,
    pub max_triangles: usize,
    pub max_distance: f32,
    pub update_divisor: u32,
    /// `None` = любые surfaces; `Some` = только с semantic label из списка
    pub label_allow_list: Option<Vec<String>>,
    /// Спавнить debug-визуал для каждого room-mesh collider
    pub debug_visuals: bool,
}

impl Default for RoomMeshConfig {
    fn default() -> Self {
        Self {
            max_surfaces: ROOM_MESH_MAX_SURFACES,
            max_triangles: ROOM_MESH_MAX_TRIANGLES,
            max_distance: ROOM_MESH_MAX_DISTANCE,
            update_divisor: ROOM_MESH_UPDATE_DIVISOR,
            label_allow_list: None,
            debug_visuals: true,
        }
    }
}

impl RoomMeshConfig {
    /// Проходит ли surface с таким label через allow-list
    pub fn accepts_label(&self, label: Option<&str>) -> bool {
        match (&self.label_allow_list, label) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(allowed), Some(label)) => allowed.iter().any(|a| a == label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub width: f32,
    pub height: f32,
    pub thickness: f32,
    pub visual_alpha: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            width: PLACED_COLLIDER_WIDTH,
            height: PLACED_COLLIDER_HEIGHT,
            thickness: PLACED_COLLIDER_THICKNESS,
            visual_alpha: PLACED_VISUAL_ALPHA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorConfig {
    pub default_height: f32,
    pub ground_half_extent: f32,
    pub ground_thickness: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            default_height: DEFAULT_FLOOR_HEIGHT,
            ground_half_extent: GROUND_HALF_EXTENT,
            ground_thickness: GROUND_THICKNESS,
        }
    }
}

/// Какая рука что делает
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandAssignment {
    pub floor: Handedness,
    pub placement: Handedness,
    pub firing: Handedness,
}

impl Default for HandAssignment {
    fn default() -> Self {
        Self {
            floor: Handedness::Right,
            placement: Handedness::Left,
            firing: Handedness::Right,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub projectile: ProjectileConfig,
    pub room_mesh: RoomMeshConfig,
    pub placement: PlacementConfig,
    pub floor: FloorConfig,
    pub hands: HandAssignment,
}
