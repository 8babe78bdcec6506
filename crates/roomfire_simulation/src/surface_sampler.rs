//! Surface sampler — кандидат позы пола на текущий кадр
//!
//! Раз в кадр: capability готова и есть хиты → первый (ближайший) хит.
//! Иначе кандидата нет. Отсутствие — нормальный исход, не ошибка.

use bevy::prelude::*;

use crate::xr::{HitTestFeed, Pose};

/// Кандидат на этот кадр (reticle position)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceCandidate(pub Option<Pose>);

impl SurfaceCandidate {
    pub fn pose(&self) -> Option<Pose> {
        self.0
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

/// Выбор кандидата из feed (чистая функция)
pub fn pick_candidate(feed: &HitTestFeed) -> Option<Pose> {
    if !feed.capability.is_ready() {
        return None;
    }
    feed.hits.first().copied()
}

pub fn sample_surface(feed: Res<HitTestFeed>, mut candidate: ResMut<SurfaceCandidate>) {
    let next = pick_candidate(&feed);
    // set_if_neq: не дёргаем change detection, если кандидат не менялся
    candidate.set_if_neq(SurfaceCandidate(next));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::Capability;

    #[test]
    fn test_first_hit_wins() {
        let feed = HitTestFeed {
            capability: Capability::Ready,
            hits: vec![
                Pose::from_position(Vec3::new(0.0, 0.1, -1.0)),
                Pose::from_position(Vec3::new(0.0, 0.5, -3.0)),
            ],
        };
        assert_eq!(pick_candidate(&feed).map(|p| p.position.y), Some(0.1));
    }

    #[test]
    fn test_no_candidate_without_capability() {
        let feed = HitTestFeed {
            capability: Capability::Pending,
            hits: vec![Pose::from_position(Vec3::ZERO)],
        };
        assert_eq!(pick_candidate(&feed), None);

        let empty = HitTestFeed {
            capability: Capability::Ready,
            hits: vec![],
        };
        assert_eq!(pick_candidate(&empty), None);
    }
}
