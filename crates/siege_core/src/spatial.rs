//! Distance and range queries.
//!
//! One implementation serves tower engagement, catapult area effect and
//! unit attacks so every system agrees on what "in range" means. Range
//! checks compare squared distances, which keeps them exact in fixed point.

use crate::entities::{Castle, Catapult, Identified, Tower, Unit};
use crate::math::{Fixed, Vec2Fixed};

/// Something with a world position.
pub trait Located {
    /// World position.
    fn position(&self) -> Vec2Fixed;
}

/// Something that engages targets within a radius.
pub trait Ranged: Located {
    /// Engagement radius.
    fn range(&self) -> Fixed;
}

impl Located for Vec2Fixed {
    fn position(&self) -> Vec2Fixed {
        *self
    }
}

impl Located for Unit {
    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

impl Ranged for Unit {
    fn range(&self) -> Fixed {
        self.range
    }
}

impl Located for Tower {
    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

impl Ranged for Tower {
    fn range(&self) -> Fixed {
        self.range
    }
}

impl Located for Catapult {
    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

impl Ranged for Catapult {
    fn range(&self) -> Fixed {
        self.range
    }
}

impl Located for Castle {
    fn position(&self) -> Vec2Fixed {
        self.position
    }
}

/// Euclidean distance between two positions.
#[must_use]
pub fn distance(a: &impl Located, b: &impl Located) -> Fixed {
    a.position().distance(b.position())
}

/// Squared distance, for ordering candidates without a square root.
#[must_use]
pub fn distance_squared(a: &impl Located, b: &impl Located) -> Fixed {
    a.position().distance_squared(b.position())
}

/// True iff `candidate` is within `attacker`'s range (inclusive).
#[must_use]
pub fn in_range(attacker: &impl Ranged, candidate: &impl Located) -> bool {
    within(attacker.position(), attacker.range(), candidate.position())
}

/// True iff `point` lies within `radius` of `origin` (inclusive).
#[must_use]
pub fn within(origin: Vec2Fixed, radius: Fixed, point: Vec2Fixed) -> bool {
    origin.distance_squared(point) <= radius.saturating_mul(radius)
}

/// Nearest candidate to `origin` with its squared distance.
///
/// Candidates must arrive in ascending id order; on equal distance the
/// first (lowest id) wins.
pub fn nearest<'a, C, I>(origin: &impl Located, candidates: I) -> Option<(&'a C, Fixed)>
where
    C: Located + Identified + 'a,
    I: IntoIterator<Item = &'a C>,
{
    let mut best: Option<(&'a C, Fixed)> = None;
    for candidate in candidates {
        let dist_sq = distance_squared(origin, candidate);
        match best {
            Some((_, best_sq)) if best_sq <= dist_sq => {}
            _ => best = Some((candidate, dist_sq)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Cooldown, Health, Lane, Team};

    fn tower_at(id: u64, x: i32, y: i32, range: i32) -> Tower {
        Tower {
            id,
            team: Team::Enemy,
            lane: Lane::Center,
            position: Vec2Fixed::from_ints(x, y),
            health: Health::new(100),
            max_casualties: 5,
            range: Fixed::from_num(range),
            volley: Cooldown::new(1),
        }
    }

    #[test]
    fn test_in_range_is_inclusive() {
        let tower = tower_at(1, 0, 0, 5);
        assert!(in_range(&tower, &Vec2Fixed::from_ints(3, 4)));
        assert!(!in_range(&tower, &Vec2Fixed::from_ints(3, 5)));
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = Vec2Fixed::from_ints(1, 1);
        let b = Vec2Fixed::from_ints(4, 5);
        assert_eq!(distance(&a, &b), Fixed::from_num(5));
    }

    #[test]
    fn test_nearest_prefers_lower_id_on_tie() {
        let towers = [tower_at(3, 0, 10, 1), tower_at(7, 0, -10, 1), tower_at(9, 0, 20, 1)];
        let (best, dist_sq) = nearest(&Vec2Fixed::ZERO, towers.iter()).unwrap();
        assert_eq!(best.id, 3);
        assert_eq!(dist_sq, Fixed::from_num(100));
    }

    #[test]
    fn test_nearest_of_nothing_is_none() {
        let towers: [Tower; 0] = [];
        assert!(nearest(&Vec2Fixed::ZERO, towers.iter()).is_none());
    }
}
