//! Scenario loading and configuration.
//!
//! A scenario bundles everything needed to start a battle: the rules, both
//! armies, the player's starting mana, a default seed, a time limit and an
//! optional timed command script for the player side.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siege_core::prelude::*;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The rules inside the scenario cannot start a battle.
    #[error("Invalid scenario rules: {0}")]
    Invalid(#[from] SiegeError),
}

/// A player command issued at a fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCommand {
    /// Tick at which the command is submitted.
    pub tick: u64,
    /// The command.
    pub command: PlayerCommand,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Battle rules.
    #[serde(default)]
    pub config: BattleConfig,
    /// Player army.
    pub player_army: ArmyRoster,
    /// Enemy army, deployed by the enemy script.
    pub enemy_army: ArmyRoster,
    /// Player mana at battle start.
    #[serde(default = "default_initial_mana")]
    pub initial_mana: u32,
    /// Seed used when none is given on the command line.
    #[serde(default)]
    pub seed: u64,
    /// Ticks after which the runner aborts the battle (0 = no limit).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Timed player commands, applied on top of any strategy.
    #[serde(default)]
    pub script: Vec<TimedCommand>,
}

const fn default_initial_mana() -> u32 {
    100
}

const fn default_max_ticks() -> u64 {
    // 10 minutes of battle time.
    10 * 60 * TICK_RATE as u64
}

fn army(counts: &[(UnitType, u32)]) -> ArmyRoster {
    counts
        .iter()
        .fold(ArmyRoster::new(), |roster, &(unit_type, count)| {
            roster.with(unit_type, count)
        })
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Resolve a built-in scenario name, falling back to a file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "skirmish" => Some(Self::skirmish()),
            "arena" => Some(Self::arena()),
            "siege" => Some(Self::siege()),
            _ => None,
        }
    }

    /// Three lanes, even armies.
    #[must_use]
    pub fn skirmish() -> Self {
        let counts = [
            (UnitType::Swordsman, 4),
            (UnitType::Archer, 3),
            (UnitType::Cavalry, 2),
            (UnitType::FireMage, 1),
            (UnitType::IceMage, 1),
            (UnitType::LightningMage, 1),
        ];
        Self {
            name: "skirmish".to_string(),
            description: "Three lanes, mirrored armies".to_string(),
            config: BattleConfig::default(),
            player_army: army(&counts),
            enemy_army: army(&counts),
            initial_mana: default_initial_mana(),
            seed: 0,
            max_ticks: default_max_ticks(),
            script: Vec::new(),
        }
    }

    /// Single lane, small armies, fast enemy cadence.
    #[must_use]
    pub fn arena() -> Self {
        let mut config = BattleConfig::single_lane();
        config.enemy.spawn_interval = 120;
        config.enemy.first_spawn = 40;
        Self {
            name: "arena".to_string(),
            description: "Single lane duel".to_string(),
            config,
            player_army: army(&[(UnitType::Swordsman, 3), (UnitType::Archer, 2)]),
            enemy_army: army(&[(UnitType::Swordsman, 3), (UnitType::Archer, 2)]),
            initial_mana: 60,
            seed: 0,
            max_ticks: 5 * 60 * u64::from(TICK_RATE),
            script: Vec::new(),
        }
    }

    /// Three lanes against a larger defending army with sturdier towers.
    #[must_use]
    pub fn siege() -> Self {
        let mut config = BattleConfig::default();
        config.tower.health = 2200;
        config.enemy.spawn_interval = 150;
        Self {
            name: "siege".to_string(),
            description: "Outnumbered assault on a fortified castle".to_string(),
            config,
            player_army: army(&[
                (UnitType::Swordsman, 5),
                (UnitType::Cavalry, 3),
                (UnitType::FireMage, 3),
            ]),
            enemy_army: army(&[
                (UnitType::Swordsman, 6),
                (UnitType::Archer, 6),
                (UnitType::IceMage, 3),
            ]),
            initial_mana: 150,
            seed: 0,
            max_ticks: default_max_ticks(),
            script: Vec::new(),
        }
    }

    /// Start a battle from this scenario with the given seed.
    pub fn start_battle(&self, seed: u64) -> Result<Battle, ScenarioError> {
        let battle = Battle::start(
            self.config.clone(),
            [self.player_army.clone(), self.enemy_army.clone()],
            self.initial_mana,
            seed,
        )?;
        Ok(battle)
    }

    /// Scripted commands due at `tick`, in file order.
    pub fn commands_at(&self, tick: u64) -> impl Iterator<Item = PlayerCommand> + '_ {
        self.script
            .iter()
            .filter(move |step| step.tick == tick)
            .map(|step| step.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios_are_valid() {
        for name in ["skirmish", "arena", "siege"] {
            let scenario = Scenario::builtin(name).unwrap();
            assert_eq!(scenario.name, name);
            assert!(scenario.config.validate().is_ok());
            assert!(scenario.start_battle(1).is_ok());
        }
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let ron = r#"(
            name: "tiny",
            player_army: (counts: {Swordsman: 2}),
            enemy_army: (counts: {Archer: 1}),
            script: [
                (tick: 5, command: DeployBattalion(unit_type: Swordsman, lane: Center)),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.initial_mana, 100);
        assert_eq!(scenario.config, BattleConfig::default());
        assert_eq!(scenario.commands_at(5).count(), 1);
        assert_eq!(scenario.commands_at(6).count(), 0);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let ron = r#"(
            name: "broken",
            config: (layout: (field_length: 10, lane_spacing: 120, lanes: [], towers: [], spawn_offset: 30)),
            player_army: (counts: {}),
            enemy_army: (counts: {}),
        )"#;
        assert!(matches!(
            Scenario::from_ron_str(ron),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/definitely/not/here.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.ron");
        let text = ron::ser::to_string_pretty(&Scenario::arena(), ron::ser::PrettyConfig::default())
            .unwrap();
        std::fs::write(&path, text).unwrap();

        let loaded = Scenario::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, Scenario::arena());
    }
}
