//! Collider placer — ручные плоскости пользователя
//!
//! По запросу: fixed box collider (width × height × thickness) + полупрозрачный
//! visual box в той же позе. Живут всю сессию, автоматически не удаляются.
//! Лимита на количество нет (см. DESIGN.md, open question).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::collision_groups;
use crate::config::PlacementConfig;
use crate::logger;
use crate::visual_sync::{spawn_paired_visual, VisualShape};
use crate::xr::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedSurface {
    pub visual: Entity,
    pub body: Entity,
}

/// Маркер: body размещённой плоскости
#[derive(Component, Debug)]
pub struct PlacedCollider;

#[derive(Resource, Debug, Default)]
pub struct PlacedSurfaces {
    pub surfaces: Vec<PlacedSurface>,
}

impl PlacedSurfaces {
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Плоскость лежит в локальной XY (нормаль = +Z позы), толщина вдоль Z
pub fn placed_half_extents(config: &PlacementConfig) -> Vec3 {
    Vec3::new(config.width * 0.5, config.height * 0.5, config.thickness * 0.5)
}

/// Создаёт collider + visual в позе `pose` и добавляет в список
pub fn place_collider(
    commands: &mut Commands,
    placed: &mut PlacedSurfaces,
    config: &PlacementConfig,
    pose: Pose,
) -> PlacedSurface {
    let half = placed_half_extents(config);
    let transform = pose.to_transform();

    let body = commands
        .spawn((
            PlacedCollider,
            RigidBody::Fixed,
            Collider::cuboid(half.x, half.y, half.z),
            collision_groups::placed_groups(),
            transform,
        ))
        .id();

    let visual = spawn_paired_visual(
        commands,
        body,
        VisualShape::Box {
            half_extents: half,
            alpha: config.visual_alpha,
        },
        transform,
    );

    let surface = PlacedSurface { visual, body };
    placed.surfaces.push(surface);

    logger::log_info(&format!(
        "Placed collider #{} at {:?}",
        placed.len(),
        pose.position
    ));

    surface
}
