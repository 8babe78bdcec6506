//! Collision groups — centralised constants для всего проекта.
//!
//! ## Архитектура:
//! - **Membership:** в каких группах находится collider
//! - **Filter:** с какими группами collider взаимодействует
//!
//! ## Группы:
//! - GROUP_1: Environment (ground + room mesh)
//! - GROUP_2: Placed surfaces (ручные плоскости)
//! - GROUP_3: Projectiles
//!
//! `CollisionGroups` решает, детектится ли контакт вообще.
//! `SolverGroups` решает, применяется ли contact response. Warm-up снаряда
//! выключает ТОЛЬКО solver (контакт детектится, тело летит сквозь).

use bevy_rapier3d::prelude::{CollisionGroups, Group, SolverGroups};

pub const GROUP_ENVIRONMENT: Group = Group::GROUP_1;
pub const GROUP_PLACED: Group = Group::GROUP_2;
pub const GROUP_PROJECTILES: Group = Group::GROUP_3;

/// Всё статическое, во что могут врезаться снаряды
pub const STATIC_WORLD: Group = GROUP_ENVIRONMENT.union(GROUP_PLACED);

/// Ground + room mesh colliders
pub fn environment_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_ENVIRONMENT, GROUP_PROJECTILES)
}

/// Размещённые пользователем плоскости
pub fn placed_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PLACED, GROUP_PROJECTILES)
}

/// Снаряды коллайдят со статикой и друг с другом
pub fn projectile_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PROJECTILES, STATIC_WORLD.union(GROUP_PROJECTILES))
}

/// Solver groups на время warm-up: response ни с кем
pub fn projectile_warmup_solver() -> SolverGroups {
    SolverGroups::new(GROUP_PROJECTILES, Group::NONE)
}

/// Solver groups после warm-up: обычный response
pub fn projectile_active_solver() -> SolverGroups {
    SolverGroups::new(GROUP_PROJECTILES, STATIC_WORLD.union(GROUP_PROJECTILES))
}
