//! XR input contract (host → simulation)
//!
//! Хост (headset runtime / desktop эмулятор) каждый кадр ДО Update пишет:
//! - `HitTestFeed` — ranked hits от hit-test capability
//! - `DetectedSurfaceFeed` — список room-mesh surfaces
//! - `ViewerPose`, `TrackedHands`
//! - события `SelectStart`, `SessionStarted`, `SessionEnded`
//!
//! Симуляция эти данные только читает.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod synthetic;

/// Position + orientation в world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Направление "вперёд" контроллера (-Z локально), нормализованное
    pub fn forward(&self) -> Vec3 {
        (self.orientation * Vec3::NEG_Z).normalize_or_zero()
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// Состояние опциональной capability (hit-test, mesh detection)
///
/// `Pending` — negotiation ещё идёт; до ответа считаем capability недоступной.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    #[default]
    Pending,
    Ready,
    Unavailable,
}

impl Capability {
    pub fn is_ready(self) -> bool {
        matches!(self, Capability::Ready)
    }
}

/// Результаты hit-test за текущий кадр (ближайший — первый)
#[derive(Resource, Debug, Clone, Default)]
pub struct HitTestFeed {
    pub capability: Capability,
    pub hits: Vec<Pose>,
}

/// Одна detected room surface в том виде, как её отдаёт runtime
///
/// `vertices` — в local space surface (относительно `pose`).
/// `handle` — transient идентификатор записи runtime, стабилен пока surface жива.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSurface {
    pub handle: u64,
    pub pose: Pose,
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub label: Option<String>,
    /// Монотонно растущий tag последнего изменения геометрии
    pub last_changed: u64,
}

impl DetectedSurface {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct DetectedSurfaceFeed {
    pub capability: Capability,
    pub surfaces: Vec<DetectedSurface>,
}

/// Поза головы (viewer). `None` пока tracking не инициализирован.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ViewerPose(pub Option<Pose>);

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TrackedHands {
    pub left: Option<Pose>,
    pub right: Option<Pose>,
}

impl TrackedHands {
    pub fn get(&self, hand: Handedness) -> Option<Pose> {
        match hand {
            Handedness::Left => self.left,
            Handedness::Right => self.right,
        }
    }
}

/// Event: trigger pull (select start) на контроллере
#[derive(Event, Debug, Clone, Copy)]
pub struct SelectStart {
    pub hand: Handedness,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SessionStarted;

/// Event: сессия закончилась — синхронный teardown всего session state
#[derive(Event, Debug, Clone, Copy)]
pub struct SessionEnded;
