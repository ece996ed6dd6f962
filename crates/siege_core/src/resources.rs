//! Resource gate (mana) and army availability.
//!
//! These are the only values shared with the external economy. The battle
//! owns them from start to finish and hands the remainder back in the
//! result record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::UnitType;
use crate::data::ManaData;

/// Regenerating currency that throttles deploy and fire commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaGate {
    /// Current balance, always within `[0, cap]`.
    current: u32,
    /// Maximum balance.
    cap: u32,
    /// Mana restored per regeneration step.
    regen_amount: u32,
    /// Ticks between regeneration steps.
    regen_interval: u64,
}

impl ManaGate {
    /// Create a gate with a starting balance, clamped to the cap.
    #[must_use]
    pub fn new(initial: u32, settings: &ManaData) -> Self {
        Self {
            current: initial.min(settings.cap),
            cap: settings.cap,
            regen_amount: settings.regen_amount,
            regen_interval: settings.regen_interval.max(1),
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum balance.
    #[must_use]
    pub const fn cap(&self) -> u32 {
        self.cap
    }

    /// Check if `amount` can be spent.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Spend mana. Returns `false` and leaves the balance untouched when
    /// the balance is too low.
    pub fn spend(&mut self, amount: u32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.current -= amount;
        true
    }

    /// Apply regeneration for `tick`. Returns the amount restored.
    pub fn regenerate(&mut self, tick: u64) -> u32 {
        if tick == 0 || tick % self.regen_interval != 0 {
            return 0;
        }
        let restored = self.regen_amount.min(self.cap - self.current);
        self.current += restored;
        restored
    }
}

/// Battalions available to deploy, per unit type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ArmyRoster {
    counts: BTreeMap<UnitType, u32>,
}

impl ArmyRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the count for a unit type.
    #[must_use]
    pub fn with(mut self, unit_type: UnitType, count: u32) -> Self {
        self.set(unit_type, count);
        self
    }

    /// Set the count for a unit type.
    pub fn set(&mut self, unit_type: UnitType, count: u32) {
        if count == 0 {
            self.counts.remove(&unit_type);
        } else {
            self.counts.insert(unit_type, count);
        }
    }

    /// Battalions available of a type.
    #[must_use]
    pub fn available(&self, unit_type: UnitType) -> u32 {
        self.counts.get(&unit_type).copied().unwrap_or(0)
    }

    /// Take one battalion. Returns `false` if none remain.
    pub fn take(&mut self, unit_type: UnitType) -> bool {
        let available = self.available(unit_type);
        if available == 0 {
            return false;
        }
        self.set(unit_type, available - 1);
        true
    }

    /// Total battalions across all types.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Check if the roster is exhausted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Unit types with at least one battalion, in catalog order.
    pub fn types(&self) -> impl Iterator<Item = UnitType> + '_ {
        self.counts.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ManaData {
        ManaData {
            cap: 100,
            regen_amount: 30,
            regen_interval: 10,
            manual_fire_cost: 40,
        }
    }

    #[test]
    fn test_initial_balance_clamped_to_cap() {
        assert_eq!(ManaGate::new(500, &settings()).current(), 100);
    }

    #[test]
    fn test_spend_rejects_without_mutation() {
        let mut gate = ManaGate::new(20, &settings());
        assert!(!gate.spend(25));
        assert_eq!(gate.current(), 20);
        assert!(gate.spend(20));
        assert_eq!(gate.current(), 0);
    }

    #[test]
    fn test_regeneration_cadence_and_cap() {
        let mut gate = ManaGate::new(80, &settings());
        assert_eq!(gate.regenerate(5), 0);
        assert_eq!(gate.regenerate(10), 20);
        assert_eq!(gate.current(), 100);
        assert_eq!(gate.regenerate(20), 0);
    }

    #[test]
    fn test_roster_take_until_empty() {
        let mut roster = ArmyRoster::new().with(UnitType::Archer, 2);
        assert!(roster.take(UnitType::Archer));
        assert!(roster.take(UnitType::Archer));
        assert!(!roster.take(UnitType::Archer));
        assert!(roster.is_empty());
        assert!(!roster.take(UnitType::Cavalry));
    }
}
