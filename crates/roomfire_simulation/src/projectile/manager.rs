//! ProjectileManager — ring buffer живых снарядов
//!
//! Архитектура:
//! - Каждый снаряд = physics body (Rapier ball) + visual sphere
//! - Capacity — hard cap: при переполнении вытесняется САМЫЙ СТАРЫЙ (FIFO, не LRU)
//! - Warm-up: первые `warmup_secs` solver response выключен (SolverGroups),
//!   включение — по timestamp в `tick`, без отдельных таймеров
//! - Expiry: `now - created_at > lifetime` ⇒ despawn пары

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use crate::collision_groups;
use crate::config::ProjectileConfig;
use crate::logger;
use crate::visual_sync::{despawn_pair, spawn_paired_visual, VisualShape};

/// Запись о живом снаряде
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Порядковый номер выстрела (с 1)
    pub serial: u64,
    pub body: Entity,
    pub visual: Entity,
    pub created_at: f64,
    /// Когда включить contact response; `None` = уже включён
    pub collision_enabled_at: Option<f64>,
}

/// Маркер: body снаряда
#[derive(Component, Debug, Clone, Copy)]
pub struct ProjectileBody {
    pub serial: u64,
}

/// Маркер: visual снаряда
#[derive(Component, Debug, Clone, Copy)]
pub struct ProjectileVisual;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub expired: usize,
    pub collision_enabled: usize,
}

#[derive(Resource, Debug, Default)]
pub struct ProjectileManager {
    ring: VecDeque<Projectile>,
    next_serial: u64,
}

impl ProjectileManager {
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Снаряды от старого к новому
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.ring.iter()
    }

    /// Выстрел. `direction` должен быть нормализован вызывающим.
    ///
    /// Возвращает запись нового снаряда; `None` только при capacity = 0.
    pub fn spawn(
        &mut self,
        commands: &mut Commands,
        config: &ProjectileConfig,
        origin: Vec3,
        direction: Vec3,
        now: f64,
        rng: &mut impl Rng,
    ) -> Option<Projectile> {
        if config.capacity == 0 {
            return None;
        }

        while self.ring.len() >= config.capacity {
            if let Some(oldest) = self.ring.pop_front() {
                despawn_pair(commands, oldest.body, Some(oldest.visual));
                logger::log(&format!("Projectile #{} evicted (cap {})", oldest.serial, config.capacity));
            }
        }

        self.next_serial += 1;
        let serial = self.next_serial;

        let tumble = config.max_tumble.abs();
        let angvel = Vec3::new(
            rng.gen_range(-tumble..=tumble),
            rng.gen_range(-tumble..=tumble),
            rng.gen_range(-tumble..=tumble),
        );

        let warming_up = config.warmup_secs > 0.0;
        let solver = if warming_up {
            collision_groups::projectile_warmup_solver()
        } else {
            collision_groups::projectile_active_solver()
        };

        let transform = Transform::from_translation(origin);
        let body = commands
            .spawn((
                ProjectileBody { serial },
                RigidBody::Dynamic,
                Collider::ball(config.radius),
                ColliderMassProperties::Mass(config.mass),
                Velocity {
                    linvel: direction * config.speed,
                    angvel,
                },
                Restitution::coefficient(config.restitution),
                Friction::coefficient(config.friction),
                Ccd::enabled(),
                collision_groups::projectile_groups(),
                solver,
                transform,
            ))
            .id();

        let visual = spawn_paired_visual(
            commands,
            body,
            VisualShape::Sphere {
                radius: config.radius,
            },
            transform,
        );
        commands.entity(visual).insert(ProjectileVisual);

        let projectile = Projectile {
            serial,
            body,
            visual,
            created_at: now,
            collision_enabled_at: warming_up.then_some(now + config.warmup_secs),
        };
        self.ring.push_back(projectile);

        Some(projectile)
    }

    /// Expiry + включение collision response после warm-up
    pub fn tick(&mut self, commands: &mut Commands, config: &ProjectileConfig, now: f64) -> TickReport {
        let mut report = TickReport::default();

        self.ring.retain(|projectile| {
            if now - projectile.created_at > config.lifetime_secs {
                despawn_pair(commands, projectile.body, Some(projectile.visual));
                report.expired += 1;
                false
            } else {
                true
            }
        });

        for projectile in self.ring.iter_mut() {
            let Some(enable_at) = projectile.collision_enabled_at else {
                continue;
            };
            if now >= enable_at {
                commands
                    .entity(projectile.body)
                    .try_insert(collision_groups::projectile_active_solver());
                projectile.collision_enabled_at = None;
                report.collision_enabled += 1;
            }
        }

        if report.expired > 0 {
            logger::log(&format!(
                "{} projectile(s) expired, {} alive",
                report.expired,
                self.ring.len()
            ));
        }

        report
    }

    /// Удаляет все снаряды немедленно. Возвращает сколько удалено.
    pub fn clear_all(&mut self, commands: &mut Commands) -> usize {
        let count = self.ring.len();
        for projectile in self.ring.drain(..) {
            despawn_pair(commands, projectile.body, Some(projectile.visual));
        }
        count
    }
}
