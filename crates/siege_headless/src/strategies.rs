//! Scripted player strategies for headless playtesting.
//!
//! A strategy looks at the battle once per tick and decides which commands
//! to submit for the player side. Strategies are pure functions of the
//! battle state plus their own cursor, so a seeded run stays reproducible.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siege_core::prelude::*;

/// Error type for strategy operations.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// File not found.
    #[error("Strategy file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse strategy: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Unknown built-in name.
    #[error("Unknown strategy: {0}")]
    Unknown(String),
}

/// How a strategy picks the lane for its next deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanePolicy {
    /// Cycle through the lanes in play.
    RoundRobin,
    /// Always the same lane (falls back to round robin if it is not in play).
    Focus(Lane),
    /// The lane with the fewest friendly battalions.
    Reinforce,
}

/// A player strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy name.
    pub name: String,
    /// Deployment preference, tried in order until one is affordable and in stock.
    pub preferred: Vec<UnitType>,
    /// Lane selection.
    pub lanes: LanePolicy,
    /// Do not deploy until at least this tick.
    #[serde(default)]
    pub first_deploy: u64,
    /// Minimum ticks between deployments.
    #[serde(default = "default_deploy_gap")]
    pub deploy_gap: u64,
    /// Mana kept in reserve for manual catapult shots.
    #[serde(default)]
    pub mana_reserve: u32,
    /// Fire ready catapults manually.
    #[serde(default)]
    pub manual_fire: bool,
}

const fn default_deploy_gap() -> u64 {
    20
}

impl Default for Strategy {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Strategy {
    /// Load a strategy from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StrategyError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, StrategyError> {
        let strategy: Strategy = ron::from_str(ron)?;
        Ok(strategy)
    }

    /// Resolve a built-in name, falling back to a file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, StrategyError> {
        match name_or_path {
            "balanced" => Ok(Self::balanced()),
            "rush" => Ok(Self::rush()),
            "artillery" => Ok(Self::artillery()),
            "idle" => Ok(Self::idle()),
            other if Path::new(other).extension().is_some() => Self::load(other),
            other => Err(StrategyError::Unknown(other.to_string())),
        }
    }

    /// Mixed army spread evenly over the lanes.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: "balanced".to_string(),
            preferred: UnitType::ALL.to_vec(),
            lanes: LanePolicy::RoundRobin,
            first_deploy: 0,
            deploy_gap: 60,
            mana_reserve: 0,
            manual_fire: false,
        }
    }

    /// Cheap melee as fast as mana allows, all in the center.
    #[must_use]
    pub fn rush() -> Self {
        Self {
            name: "rush".to_string(),
            preferred: vec![UnitType::Swordsman, UnitType::Cavalry, UnitType::Archer],
            lanes: LanePolicy::Focus(Lane::Center),
            first_deploy: 0,
            deploy_gap: 10,
            mana_reserve: 0,
            manual_fire: false,
        }
    }

    /// Casters behind the weakest lane, mana held back for catapult shots.
    #[must_use]
    pub fn artillery() -> Self {
        Self {
            name: "artillery".to_string(),
            preferred: vec![
                UnitType::FireMage,
                UnitType::IceMage,
                UnitType::LightningMage,
                UnitType::Archer,
            ],
            lanes: LanePolicy::Reinforce,
            first_deploy: 100,
            deploy_gap: 80,
            mana_reserve: 40,
            manual_fire: true,
        }
    }

    /// Never acts. Useful for measuring the enemy script alone.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            preferred: Vec::new(),
            lanes: LanePolicy::RoundRobin,
            first_deploy: u64::MAX,
            deploy_gap: default_deploy_gap(),
            mana_reserve: 0,
            manual_fire: false,
        }
    }
}

/// Per-battle progress of a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyState {
    next_lane: usize,
    last_deploy: Option<u64>,
}

impl Strategy {
    /// Commands to submit before the next tick.
    pub fn decide<R: CasualtyRoll>(
        &self,
        battle: &Battle<R>,
        cursor: &mut StrategyState,
    ) -> Vec<PlayerCommand> {
        let state = battle.state();
        let config = battle.config();
        let now = state.tick();
        let mut commands = Vec::new();
        let mut mana = state.mana().current();

        if self.manual_fire && now >= self.first_deploy {
            for catapult in state.catapults().iter() {
                if catapult.team != Team::Player || !catapult.reload.is_ready(now) {
                    continue;
                }
                if mana < config.mana.manual_fire_cost {
                    break;
                }
                mana -= config.mana.manual_fire_cost;
                commands.push(PlayerCommand::ManualFire {
                    catapult: catapult.id,
                    target_lane: catapult.lane,
                });
            }
        }

        let spaced = cursor
            .last_deploy
            .map_or(true, |last| now.saturating_sub(last) >= self.deploy_gap);
        if now < self.first_deploy || !spaced {
            return commands;
        }

        let budget = mana.saturating_sub(self.mana_reserve);
        let roster = state.roster(Team::Player);
        let choice = self.preferred.iter().copied().find(|unit_type| {
            roster.available(*unit_type) > 0 && config.catalog.get(*unit_type).cost <= budget
        });
        if let Some(unit_type) = choice {
            let lane = self.pick_lane(battle, cursor);
            cursor.last_deploy = Some(now);
            commands.push(PlayerCommand::DeployBattalion { unit_type, lane });
        }
        commands
    }

    fn pick_lane<R: CasualtyRoll>(&self, battle: &Battle<R>, cursor: &mut StrategyState) -> Lane {
        let lanes = &battle.config().layout.lanes;
        let round_robin = |cursor: &mut StrategyState| {
            let lane = lanes[cursor.next_lane % lanes.len()];
            cursor.next_lane = (cursor.next_lane + 1) % lanes.len();
            lane
        };
        match self.lanes {
            LanePolicy::Focus(lane) if lanes.contains(&lane) => lane,
            LanePolicy::Focus(_) | LanePolicy::RoundRobin => round_robin(cursor),
            LanePolicy::Reinforce => {
                let units = battle.state().units();
                lanes
                    .iter()
                    .copied()
                    .min_by_key(|lane| {
                        units
                            .iter()
                            .filter(|unit| unit.team == Team::Player && unit.lane == *lane)
                            .count()
                    })
                    .unwrap_or(Lane::Center)
            }
        }
    }
}
