//! Interaction router — select (trigger pull) → действие
//!
//! Приоритет (первое совпадение побеждает, ровно одно действие на событие):
//! 1. пол не зафиксирован ∧ есть кандидат ∧ floor-рука → LockFloor
//! 2. placement-рука ∧ есть кандидат → PlaceCollider
//! 3. пол зафиксирован ∧ firing-рука → Fire
//!
//! Ни одно условие не совпало — тихий no-op.

use bevy::prelude::*;

use crate::collider_placer::{place_collider, PlacedSurfaces};
use crate::config::{HandAssignment, SandboxConfig};
use crate::floor_anchor::{FloorAnchor, FloorLocked};
use crate::logger;
use crate::projectile::ProjectileManager;
use crate::surface_sampler::SurfaceCandidate;
use crate::xr::{Handedness, SelectStart, TrackedHands};
use crate::DeterministicRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectAction {
    LockFloor,
    PlaceCollider,
    Fire,
}

/// Чистая policy-функция роутера
pub fn route_select(
    hand: Handedness,
    floor_locked: bool,
    has_candidate: bool,
    hands: &HandAssignment,
) -> Option<SelectAction> {
    if !floor_locked && has_candidate && hand == hands.floor {
        return Some(SelectAction::LockFloor);
    }
    if hand == hands.placement && has_candidate {
        return Some(SelectAction::PlaceCollider);
    }
    if floor_locked && hand == hands.firing {
        return Some(SelectAction::Fire);
    }
    None
}

/// Event: снаряд выпущен (для звука/haptics хоста)
#[derive(Event, Debug, Clone, Copy)]
pub struct ProjectileFired {
    pub serial: u64,
    pub hand: Handedness,
}

/// Что сделает select каждой руки прямо сейчас (для hint текста хоста)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionHint {
    pub left: Option<SelectAction>,
    pub right: Option<SelectAction>,
}

impl InteractionHint {
    pub fn message(&self) -> &'static str {
        match (self.left, self.right) {
            (_, Some(SelectAction::LockFloor)) | (Some(SelectAction::LockFloor), _) => {
                "Aim at the floor and pull the trigger to set it"
            }
            (Some(SelectAction::PlaceCollider), Some(SelectAction::Fire))
            | (Some(SelectAction::Fire), Some(SelectAction::PlaceCollider)) => {
                "Trigger to fire, other hand places a surface"
            }
            (_, Some(SelectAction::Fire)) | (Some(SelectAction::Fire), _) => "Pull the trigger to fire",
            (_, Some(SelectAction::PlaceCollider)) | (Some(SelectAction::PlaceCollider), _) => {
                "Pull the trigger to place a surface"
            }
            (None, None) => "Look around to find a surface",
        }
    }
}

/// Система: обработка select событий
#[allow(clippy::too_many_arguments)]
pub fn route_select_events(
    mut commands: Commands,
    mut events: EventReader<SelectStart>,
    mut anchor: ResMut<FloorAnchor>,
    mut placed: ResMut<PlacedSurfaces>,
    mut projectiles: ResMut<ProjectileManager>,
    mut rng: ResMut<DeterministicRng>,
    mut floor_locked: EventWriter<FloorLocked>,
    mut fired: EventWriter<ProjectileFired>,
    candidate: Res<SurfaceCandidate>,
    hands: Res<TrackedHands>,
    config: Res<SandboxConfig>,
    time: Res<Time>,
) {
    for event in events.read() {
        let action = route_select(
            event.hand,
            anchor.is_locked(),
            candidate.is_some(),
            &config.hands,
        );

        match action {
            Some(SelectAction::LockFloor) => {
                if let Some(height) = anchor.try_lock(candidate.pose()) {
                    logger::log_info(&format!("Floor locked at y={:.3}", height));
                    floor_locked.write(FloorLocked { height });
                }
            }
            Some(SelectAction::PlaceCollider) => {
                if let Some(pose) = candidate.pose() {
                    place_collider(&mut commands, &mut placed, &config.placement, pose);
                }
            }
            Some(SelectAction::Fire) => {
                let Some(pose) = hands.get(event.hand) else {
                    logger::log(&format!("Fire ignored: {:?} hand not tracked", event.hand));
                    continue;
                };
                let direction = pose.forward();
                if direction == Vec3::ZERO {
                    continue;
                }
                let spawned = projectiles.spawn(
                    &mut commands,
                    &config.projectile,
                    pose.position,
                    direction,
                    time.elapsed_secs_f64(),
                    &mut rng.rng,
                );
                if let Some(projectile) = spawned {
                    fired.write(ProjectileFired {
                        serial: projectile.serial,
                        hand: event.hand,
                    });
                }
            }
            None => {}
        }
    }
}

/// Система: пересчёт hint для UI хоста
pub fn update_interaction_hint(
    anchor: Res<FloorAnchor>,
    candidate: Res<SurfaceCandidate>,
    config: Res<SandboxConfig>,
    mut hint: ResMut<InteractionHint>,
) {
    let locked = anchor.is_locked();
    let has_candidate = candidate.is_some();
    hint.set_if_neq(InteractionHint {
        left: route_select(Handedness::Left, locked, has_candidate, &config.hands),
        right: route_select(Handedness::Right, locked, has_candidate, &config.hands),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Handedness = Handedness::Left;
    const R: Handedness = Handedness::Right;

    #[test]
    fn test_floor_hand_locks_before_anything() {
        let hands = HandAssignment::default();
        assert_eq!(route_select(R, false, true, &hands), Some(SelectAction::LockFloor));
    }

    #[test]
    fn test_firing_needs_locked_floor() {
        let hands = HandAssignment::default();
        assert_eq!(route_select(R, false, false, &hands), None);
        assert_eq!(route_select(R, true, false, &hands), Some(SelectAction::Fire));
        assert_eq!(route_select(R, true, true, &hands), Some(SelectAction::Fire));
    }

    #[test]
    fn test_placement_hand_needs_candidate() {
        let hands = HandAssignment::default();
        assert_eq!(route_select(L, false, true, &hands), Some(SelectAction::PlaceCollider));
        assert_eq!(route_select(L, true, true, &hands), Some(SelectAction::PlaceCollider));
        assert_eq!(route_select(L, true, false, &hands), None);
    }

    #[test]
    fn test_priority_when_one_hand_does_everything() {
        let hands = HandAssignment {
            floor: R,
            placement: R,
            firing: R,
        };
        // Пол не зафиксирован — lock важнее placement
        assert_eq!(route_select(R, false, true, &hands), Some(SelectAction::LockFloor));
        // После lock — placement важнее выстрела, пока есть кандидат
        assert_eq!(route_select(R, true, true, &hands), Some(SelectAction::PlaceCollider));
        assert_eq!(route_select(R, true, false, &hands), Some(SelectAction::Fire));
    }

    #[test]
    fn test_hint_message() {
        let hint = InteractionHint {
            left: Some(SelectAction::PlaceCollider),
            right: Some(SelectAction::LockFloor),
        };
        assert_eq!(hint.message(), "Aim at the floor and pull the trigger to set it");
        assert_eq!(InteractionHint::default().message(), "Look around to find a surface");
    }
}
