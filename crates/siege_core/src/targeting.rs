//! Target resolution.
//!
//! Resolution is a pure function of [`BattleState`]: [`resolve_targets`]
//! reads an immutable view and returns a [`TargetPlan`], which is applied
//! afterwards in one step. No attacker ever sees another attacker's new
//! target mid-pass.
//!
//! # Policy
//!
//! - Units consider enemy catapults and standing towers on their own lane,
//!   plus the enemy castle. The nearest wins; exact distance ties go to
//!   catapult, then tower, then castle, then lower id.
//! - Catapults consider standing enemy towers on their lane and fall back to
//!   the enemy castle only when none remain. They never target units.
//! - Towers do not pick a target; [`units_in_tower_range`] yields every
//!   enemy battalion their volley reaches.

use crate::components::{EntityId, TargetKind, TargetRef};
use crate::entities::{Catapult, Tower, Unit};
use crate::math::Fixed;
use crate::spatial::{distance_squared, in_range, nearest};
use crate::state::BattleState;

/// Targets chosen for every mobile attacker, in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPlan {
    /// Unit id and its chosen target.
    pub units: Vec<(EntityId, Option<TargetRef>)>,
    /// Catapult id and its chosen structure.
    pub catapults: Vec<(EntityId, Option<TargetRef>)>,
}

impl TargetPlan {
    /// Write the chosen targets back into the state.
    pub fn apply(self, state: &mut BattleState) {
        for (id, target) in self.units {
            if let Some(unit) = state.units_mut().get_mut(id) {
                unit.target = target;
            }
        }
        for (id, target) in self.catapults {
            if let Some(catapult) = state.catapults_mut().get_mut(id) {
                catapult.target = target;
            }
        }
    }
}

/// Resolve targets for every unit and catapult from the current state.
#[must_use]
pub fn resolve_targets(state: &BattleState) -> TargetPlan {
    TargetPlan {
        units: state
            .units()
            .iter()
            .map(|unit| (unit.id, unit_target(state, unit)))
            .collect(),
        catapults: state
            .catapults()
            .iter()
            .map(|catapult| (catapult.id, catapult_target(state, catapult)))
            .collect(),
    }
}

/// Choose a battalion's target.
#[must_use]
pub fn unit_target(state: &BattleState, unit: &Unit) -> Option<TargetRef> {
    let enemy = unit.team.opponent();
    let mut candidates: Vec<(Fixed, TargetKind, EntityId)> = Vec::with_capacity(3);

    if let Some((catapult, dist_sq)) = nearest(unit, state.live_catapults(enemy, unit.lane)) {
        candidates.push((dist_sq, TargetKind::Catapult, catapult.id));
    }
    if let Some((tower, dist_sq)) = nearest(unit, state.standing_towers(enemy, unit.lane)) {
        candidates.push((dist_sq, TargetKind::Tower, tower.id));
    }
    let castle = state.castle(enemy);
    if !castle.is_destroyed() {
        candidates.push((distance_squared(unit, castle), TargetKind::Castle, castle.id));
    }

    candidates
        .into_iter()
        .min()
        .map(|(_, kind, id)| TargetRef::new(kind, id))
}

/// Choose a catapult's structure target.
#[must_use]
pub fn catapult_target(state: &BattleState, catapult: &Catapult) -> Option<TargetRef> {
    let enemy = catapult.team.opponent();
    if let Some((tower, _)) = nearest(catapult, state.standing_towers(enemy, catapult.lane)) {
        return Some(TargetRef::new(TargetKind::Tower, tower.id));
    }
    let castle = state.castle(enemy);
    (!castle.is_destroyed()).then(|| TargetRef::new(TargetKind::Castle, castle.id))
}

/// Whether any enemy structure on the catapult's lane, or the enemy castle,
/// is within its range.
#[must_use]
pub fn catapult_has_structure_in_range(state: &BattleState, catapult: &Catapult) -> bool {
    let enemy = catapult.team.opponent();
    let castle = state.castle(enemy);
    state
        .standing_towers(enemy, catapult.lane)
        .any(|tower| in_range(catapult, tower))
        || (!castle.is_destroyed() && in_range(catapult, castle))
}

/// Ids of every enemy battalion inside a tower's range, in id order.
#[must_use]
pub fn units_in_tower_range(state: &BattleState, tower: &Tower) -> Vec<EntityId> {
    state
        .units()
        .iter()
        .filter(|unit| unit.team != tower.team && !unit.battalion.is_wiped())
        .filter(|unit| in_range(tower, *unit))
        .map(|unit| unit.id)
        .collect()
}
