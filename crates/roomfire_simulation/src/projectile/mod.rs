//! Projectiles — шарики из руки
//!
//! Содержит:
//! - ProjectileManager (ring buffer, spawn/tick/clear_all)
//! - системы tick + clear по запросу хоста

pub mod manager;

pub use manager::{Projectile, ProjectileBody, ProjectileManager, ProjectileVisual, TickReport};

use bevy::prelude::*;

use crate::config::SandboxConfig;

/// Event: хост просит убрать все снаряды (кнопка "clear" в UI)
#[derive(Event, Debug, Clone, Copy)]
pub struct ClearProjectiles;

/// Система: expiry + warm-up sweep
pub fn tick_projectiles(
    mut commands: Commands,
    mut manager: ResMut<ProjectileManager>,
    config: Res<SandboxConfig>,
    time: Res<Time>,
) {
    if manager.is_empty() {
        return;
    }
    manager.tick(&mut commands, &config.projectile, time.elapsed_secs_f64());
}

pub fn clear_projectiles_on_request(
    mut commands: Commands,
    mut events: EventReader<ClearProjectiles>,
    mut manager: ResMut<ProjectileManager>,
) {
    if events.read().count() == 0 {
        return;
    }
    let cleared = manager.clear_all(&mut commands);
    crate::logger::log_info(&format!("Cleared {} projectile(s)", cleared));
}
