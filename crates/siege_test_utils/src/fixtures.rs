//! Test fixtures and helpers.
//!
//! Pre-built battle configurations, rosters and scripted command runs
//! for consistent testing.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};
use siege_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Default rules with catapult spawns and the enemy script switched off.
#[must_use]
pub fn quiet_config() -> BattleConfig {
    let mut config = BattleConfig::default();
    config.catapult.spawn_interval = 0;
    config.enemy.spawn_interval = 0;
    config
}

/// Single lane, one 1000-health enemy tower, no player tower, nothing else
/// moving. A swordsman with damage 100 attacking every tick.
#[must_use]
pub fn lone_tower_config() -> BattleConfig {
    let mut config = BattleConfig::single_lane();
    config.catapult.spawn_interval = 0;
    config.enemy.spawn_interval = 0;
    config.layout.towers.retain(|tower| tower.team == Team::Enemy);
    config.tower.health = 1000;
    config.tower.max_casualties = 0;
    let mut swordsman = *config.catalog.get(UnitType::Swordsman);
    swordsman.damage = 100;
    swordsman.attack_interval = 1;
    config.catalog.set(UnitType::Swordsman, swordsman);
    config
}

/// [`lone_tower_config`] with the tower's default casualty roll restored,
/// so the tower fires back while it is attacked.
#[must_use]
pub fn lone_tower_config_with_volleys() -> BattleConfig {
    let mut config = lone_tower_config();
    config.tower.max_casualties = BattleConfig::default().tower.max_casualties;
    config
}

/// A roster holding `count` battalions of every type.
#[must_use]
pub fn full_roster(count: u32) -> ArmyRoster {
    let mut roster = ArmyRoster::new();
    for unit_type in UnitType::ALL {
        roster.set(unit_type, count);
    }
    roster
}

/// Rosters for both sides, `count` of every type each.
#[must_use]
pub fn full_rosters(count: u32) -> [ArmyRoster; 2] {
    [full_roster(count), full_roster(count)]
}

/// A player command scheduled for a specific tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    /// Tick at which the command is submitted.
    pub tick: u64,
    /// The command.
    pub command: PlayerCommand,
}

/// Parse a RON list of scripted commands.
///
/// # Errors
///
/// Returns the RON error message if the script is malformed.
pub fn parse_script(ron: &str) -> Result<Vec<ScriptedCommand>, String> {
    ron::from_str(ron).map_err(|e| e.to_string())
}

/// Run `ticks` ticks, submitting each scripted command when its tick comes
/// up. Rejected submissions are ignored. Returns every event produced.
pub fn run_script<R: CasualtyRoll>(
    battle: &mut Battle<R>,
    script: &[ScriptedCommand],
    ticks: u64,
) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        let now = battle.current_tick();
        for scripted in script.iter().filter(|s| s.tick == now) {
            if let Err(reason) = battle.submit(scripted.command) {
                tracing::debug!(tick = now, %reason, "Scripted command rejected");
            }
        }
        events.extend(battle.tick().events);
        if battle.is_over() {
            break;
        }
    }
    events
}
