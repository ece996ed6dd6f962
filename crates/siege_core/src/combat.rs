//! Combat resolution.
//!
//! Combat runs in three steps over a settled state:
//!
//! 1. [`collect_intents`] reads the state and records every attack that
//!    fires this tick: unit strikes, tower volleys and catapult shots.
//! 2. [`apply_intents`] applies them with clamping and restarts the
//!    attackers' cooldowns.
//! 3. [`remove_destroyed`] drops wiped battalions, fallen towers and
//!    broken catapults before the tick ends.
//!
//! Tower casualties come from an injected [`CasualtyRoll`], so tests can
//! swap the seeded source for a fixed one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::components::{EntityId, TargetKind, TargetRef};
use crate::entities::{Catapult, Tower, Unit};
use crate::spatial::in_range;
use crate::state::BattleState;
use crate::targeting::units_in_tower_range;

/// Source of per-battalion tower casualties.
pub trait CasualtyRoll {
    /// Soldiers lost by one battalion to one volley, in `1..=max` (0 if `max` is 0).
    fn roll(&mut self, max: u8) -> u8;
}

/// Seeded casualty source. Same seed, same sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededCasualties {
    rng: ChaCha8Rng,
}

impl SeededCasualties {
    /// Create a source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededCasualties {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CasualtyRoll for SeededCasualties {
    fn roll(&mut self, max: u8) -> u8 {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(1..=max)
    }
}

/// Always rolls the same count, capped at the volley maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedCasualties(pub u8);

impl CasualtyRoll for FixedCasualties {
    fn roll(&mut self, max: u8) -> u8 {
        self.0.min(max)
    }
}

/// Who fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attacker {
    /// A battalion.
    Unit(EntityId),
    /// A tower volley.
    Tower(EntityId),
    /// A catapult shot.
    Catapult(EntityId),
}

/// An attack that fires this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatIntent {
    /// Flat damage against a health-bearing target.
    Damage {
        /// Attacker whose cooldown restarts.
        attacker: Attacker,
        /// What is hit.
        target: TargetRef,
        /// Damage before clamping.
        amount: u32,
    },
    /// Battalion attrition from a tower volley.
    Casualties {
        /// Attacker whose cooldown restarts.
        attacker: Attacker,
        /// Battalion hit.
        unit: EntityId,
        /// Soldiers lost before clamping.
        count: u8,
    },
}

/// Entities removed at the end of combat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    /// Wiped battalions.
    pub units: Vec<Unit>,
    /// Fallen towers.
    pub towers: Vec<Tower>,
    /// Broken catapults.
    pub catapults: Vec<Catapult>,
}

impl Removed {
    /// Check if nothing was removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.towers.is_empty() && self.catapults.is_empty()
    }
}

/// Record every attack that fires at the current tick.
///
/// Reads only; cooldowns are restarted by [`apply_intents`].
pub fn collect_intents(state: &BattleState, roller: &mut impl CasualtyRoll) -> Vec<CombatIntent> {
    let now = state.tick();
    let mut intents = Vec::new();

    for unit in state.units().iter() {
        let Some(target) = unit.target else { continue };
        let Some(position) = state.target_position(target) else {
            continue;
        };
        if in_range(unit, &position) && unit.attack.is_ready(now) {
            intents.push(CombatIntent::Damage {
                attacker: Attacker::Unit(unit.id),
                target,
                amount: unit.damage,
            });
        }
    }

    for tower in state.towers().iter() {
        if tower.is_destroyed() || !tower.volley.is_ready(now) {
            continue;
        }
        for unit in units_in_tower_range(state, tower) {
            intents.push(CombatIntent::Casualties {
                attacker: Attacker::Tower(tower.id),
                unit,
                count: roller.roll(tower.max_casualties),
            });
        }
    }

    for catapult in state.catapults().iter() {
        let Some(target) = catapult.target else { continue };
        let Some(position) = state.target_position(target) else {
            continue;
        };
        if in_range(catapult, &position) && catapult.reload.is_ready(now) {
            intents.push(CombatIntent::Damage {
                attacker: Attacker::Catapult(catapult.id),
                target,
                amount: catapult.damage,
            });
        }
    }

    intents
}

/// Apply collected intents with clamping and restart attacker cooldowns.
pub fn apply_intents(state: &mut BattleState, intents: &[CombatIntent]) {
    let now = state.tick();
    for intent in intents {
        match *intent {
            CombatIntent::Damage {
                attacker,
                target,
                amount,
            } => {
                strike(state, target, amount);
                restart_cooldown(state, attacker, now);
            }
            CombatIntent::Casualties {
                attacker,
                unit,
                count,
            } => {
                if let Some(battalion) = state.unit_mut(unit) {
                    let team = battalion.team;
                    let lost = battalion.battalion.apply_casualties(count);
                    state.stats_mut().casualties[team.index()] += u32::from(lost);
                }
                restart_cooldown(state, attacker, now);
            }
        }
    }
}

/// Apply flat damage to a target, clamped at zero. Returns damage dealt.
pub(crate) fn strike(state: &mut BattleState, target: TargetRef, amount: u32) -> u32 {
    match target.kind {
        TargetKind::Catapult => state
            .catapults_mut()
            .get_mut(target.id)
            .map_or(0, |c| c.health.apply_damage(amount)),
        TargetKind::Tower => state
            .towers_mut()
            .get_mut(target.id)
            .map_or(0, |t| t.health.apply_damage(amount)),
        TargetKind::Castle => match state.castle_by_id(target.id).map(|c| c.team) {
            Some(team) => state.castle_mut(team).health.apply_damage(amount),
            None => 0,
        },
    }
}

fn restart_cooldown(state: &mut BattleState, attacker: Attacker, now: u64) {
    match attacker {
        Attacker::Unit(id) => {
            if let Some(unit) = state.unit_mut(id) {
                unit.attack.trigger(now);
            }
        }
        Attacker::Tower(id) => {
            if let Some(tower) = state.towers_mut().get_mut(id) {
                tower.volley.trigger(now);
            }
        }
        Attacker::Catapult(id) => {
            if let Some(catapult) = state.catapults_mut().get_mut(id) {
                catapult.reload.trigger(now);
            }
        }
    }
}

/// Remove every wiped battalion, fallen tower and broken catapult.
///
/// Survivors aiming at a removed entity lose their target, so no
/// snapshot ever carries a reference to an entity that is gone.
pub fn remove_destroyed(state: &mut BattleState) -> Removed {
    let removed = Removed {
        units: state.units_mut().drain_where(|u| u.battalion.is_wiped()),
        towers: state.towers_mut().drain_where(Tower::is_destroyed),
        catapults: state.catapults_mut().drain_where(Catapult::is_destroyed),
    };

    let gone: Vec<TargetRef> = removed
        .towers
        .iter()
        .map(|t| TargetRef::new(TargetKind::Tower, t.id))
        .chain(
            removed
                .catapults
                .iter()
                .map(|c| TargetRef::new(TargetKind::Catapult, c.id)),
        )
        .collect();
    if !gone.is_empty() {
        let dangling = |target: &Option<TargetRef>| target.is_some_and(|t| gone.contains(&t));
        for unit in state.units_mut().iter_mut() {
            if dangling(&unit.target) {
                unit.target = None;
            }
        }
        for catapult in state.catapults_mut().iter_mut() {
            if dangling(&catapult.target) {
                catapult.target = None;
            }
        }
    }

    let stats = state.stats_mut();
    for tower in &removed.towers {
        stats.towers_lost[tower.team.index()] += 1;
    }
    for catapult in &removed.catapults {
        stats.catapults_lost[catapult.team.index()] += 1;
    }
    removed
}
