//! Component definitions shared by all battle entities.
//!
//! Components are plain data. Every health and battalion mutation goes
//! through a clamping method here, so a negative or over-max value can
//! never be observed.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Largest battalion a unit can hold.
pub const MAX_BATTALION: u8 = 100;

/// Side of the battle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Team {
    /// The local player.
    #[default]
    Player,
    /// The opposing side.
    Enemy,
}

impl Team {
    /// Both teams in deterministic order.
    pub const ALL: [Team; 2] = [Team::Player, Team::Enemy];

    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Index into per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }

    /// Direction of travel along the Y axis toward the enemy castle.
    #[must_use]
    pub fn forward(self) -> Fixed {
        match self {
            Self::Player => Fixed::ONE,
            Self::Enemy => -Fixed::ONE,
        }
    }
}

/// Ground path constraining movement and targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    /// Left lane.
    Left,
    /// Center lane (the only lane in single-lane layouts).
    Center,
    /// Right lane.
    Right,
}

impl Lane {
    /// All lanes in deterministic order.
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    /// X coordinate of this lane's centerline.
    #[must_use]
    pub fn centerline_x(self, spacing: Fixed) -> Fixed {
        match self {
            Self::Left => -spacing,
            Self::Center => Fixed::ZERO,
            Self::Right => spacing,
        }
    }
}

/// Fixed catalog of battalion types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Melee infantry.
    Swordsman,
    /// Ranged infantry.
    Archer,
    /// Fast melee riders.
    Cavalry,
    /// Ranged caster, heavy structure damage.
    FireMage,
    /// Ranged caster, long reach.
    IceMage,
    /// Ranged caster, fast cadence.
    LightningMage,
}

impl UnitType {
    /// Every catalog entry in deterministic order.
    pub const ALL: [UnitType; 6] = [
        UnitType::Swordsman,
        UnitType::Archer,
        UnitType::Cavalry,
        UnitType::FireMage,
        UnitType::IceMage,
        UnitType::LightningMage,
    ];
}

/// Health for damageable entities (towers, catapults, castles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if health has reached zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (u64::from(self.current) * 100 / u64::from(self.max)) as u32
        }
    }
}

/// Soldier count of a battalion, always within `[0, MAX_BATTALION]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battalion(u8);

impl Battalion {
    /// Create a battalion, clamping to the maximum size.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self(size.min(u32::from(MAX_BATTALION)) as u8)
    }

    /// A full-strength battalion.
    #[must_use]
    pub const fn full() -> Self {
        Self(MAX_BATTALION)
    }

    /// Current soldier count.
    #[must_use]
    pub const fn size(self) -> u8 {
        self.0
    }

    /// Check if no soldiers remain.
    #[must_use]
    pub const fn is_wiped(self) -> bool {
        self.0 == 0
    }

    /// Remove soldiers, returning how many were actually lost.
    pub fn apply_casualties(&mut self, casualties: u8) -> u8 {
        let actual = casualties.min(self.0);
        self.0 -= actual;
        actual
    }
}

/// Category of an attackable target, in tie-break precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetKind {
    /// Enemy siege engine.
    Catapult,
    /// Enemy defensive tower.
    Tower,
    /// Enemy castle.
    Castle,
}

/// Weak reference to a target: an id plus a kind tag, resolved by lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    /// Which collection the target lives in.
    pub kind: TargetKind,
    /// Target entity id.
    pub id: EntityId,
}

impl TargetRef {
    /// Create a new target reference.
    #[must_use]
    pub const fn new(kind: TargetKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    /// Whether the reference points at a structure (tower or castle).
    #[must_use]
    pub const fn is_structure(&self) -> bool {
        matches!(self.kind, TargetKind::Tower | TargetKind::Castle)
    }
}

/// Tick-based cooldown gate.
///
/// Ready when at least `interval` ticks have elapsed since the last action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cooldown {
    /// Minimum ticks between actions (at least 1).
    pub interval: u64,
    /// Tick of the last action, if any.
    pub last_tick: Option<u64>,
}

impl Cooldown {
    /// Create a cooldown that is ready immediately.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            last_tick: None,
        }
    }

    /// Ticks remaining until ready at `now` (0 when ready).
    #[must_use]
    pub fn remaining(&self, now: u64) -> u64 {
        match self.last_tick {
            None => 0,
            Some(last) => (last + self.interval).saturating_sub(now),
        }
    }

    /// Check if ready to act at `now`.
    #[must_use]
    pub fn is_ready(&self, now: u64) -> bool {
        self.remaining(now) == 0
    }

    /// Record an action at `now`.
    pub fn trigger(&mut self, now: u64) {
        self.last_tick = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_clamps_at_zero() {
        let mut health = Health::new(50);
        assert_eq!(health.apply_damage(30), 30);
        assert_eq!(health.apply_damage(30), 20);
        assert_eq!(health.current, 0);
        assert!(health.is_destroyed());
        assert_eq!(health.apply_damage(5), 0);
    }

    #[test]
    fn test_battalion_clamped_on_creation() {
        assert_eq!(Battalion::new(250).size(), MAX_BATTALION);
        assert_eq!(Battalion::new(40).size(), 40);
    }

    #[test]
    fn test_battalion_casualties_never_negative() {
        let mut battalion = Battalion::new(7);
        assert_eq!(battalion.apply_casualties(10), 7);
        assert!(battalion.is_wiped());
    }

    #[test]
    fn test_cooldown_gate() {
        let mut cooldown = Cooldown::new(3);
        assert!(cooldown.is_ready(0));
        cooldown.trigger(5);
        assert!(!cooldown.is_ready(6));
        assert_eq!(cooldown.remaining(6), 2);
        assert!(cooldown.is_ready(8));
    }

    #[test]
    fn test_zero_interval_cooldown_still_spaces_attacks() {
        let mut cooldown = Cooldown::new(0);
        cooldown.trigger(4);
        assert!(!cooldown.is_ready(4));
        assert!(cooldown.is_ready(5));
    }

    #[test]
    fn test_target_kind_precedence() {
        assert!(TargetKind::Catapult < TargetKind::Tower);
        assert!(TargetKind::Tower < TargetKind::Castle);
    }
}
