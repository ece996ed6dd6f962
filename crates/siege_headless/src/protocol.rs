//! JSON protocol for headless battle communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Battle state, events and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner outputs events after each tick (and state on `query`)
//! 4. On battle end, outputs `{"type":"battle_over","result":{...}}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"deploy","unit_type":"Swordsman","lane":"Center"}
//! <- {"type":"ack","cmd":"deploy"}
//! -> {"cmd":"tick","count":20}
//! <- {"type":"events","tick":0,"events":[{"event":"unit_spawned",...}]}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":20,...}
//! ```

use serde::{Deserialize, Serialize};

use siege_core::prelude::*;
use siege_core::snapshot::BattleSnapshot;

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the battle by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current battle state without advancing time.
    Query,

    /// Deploy a player battalion at the next tick.
    Deploy { unit_type: UnitType, lane: Lane },

    /// Fire a player catapult at the next tick.
    Fire { catapult: EntityId, lane: Lane },

    /// Report the state hash (for determinism verification).
    Hash,

    /// End the battle without a winner.
    Abort,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Deploy { .. } => "deploy",
            Self::Fire { .. } => "fire",
            Self::Hash => "hash",
            Self::Abort => "abort",
            Self::Quit => "quit",
        }
    }

    /// The battle command this maps to, if any.
    pub fn player_command(&self) -> Option<PlayerCommand> {
        match *self {
            Self::Deploy { unit_type, lane } => {
                Some(PlayerCommand::DeployBattalion { unit_type, lane })
            }
            Self::Fire { catapult, lane } => Some(PlayerCommand::ManualFire {
                catapult,
                target_lane: lane,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Malformed input or a command the runner cannot handle.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// The battle refused a player command.
    Rejected { cmd: String, reason: CommandError },

    /// Events from one tick.
    Events { tick: u64, events: Vec<BattleEvent> },

    /// Current battle state.
    State(StateOutput),

    /// Battle has ended.
    BattleOver { result: BattleResult },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// What kind of entity a state entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Unit,
    Tower,
    Catapult,
    Castle,
}

/// State of a single entity, with positions as plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: EntityId,
    pub kind: EntityKind,
    pub team: Team,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<Lane>,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<UnitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battalion: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
}

/// Health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub current: u32,
    pub max: u32,
}

/// Whole-battle state for a `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateOutput {
    pub tick: u64,
    pub mana: u32,
    pub mana_cap: u32,
    pub outcome: Outcome,
    pub entities: Vec<EntityState>,
    pub hash: u64,
}

impl StateOutput {
    /// Flatten a snapshot into protocol entities. Destroyed structures are
    /// listed with zero health.
    pub fn from_snapshot(snapshot: &BattleSnapshot, hash: u64) -> Self {
        let point = |v: Vec2Fixed| (v.x.to_num::<f64>(), v.y.to_num::<f64>());
        let mut entities = Vec::new();

        for castle in &snapshot.castles {
            let (x, y) = point(castle.position);
            entities.push(EntityState {
                id: castle.id,
                kind: EntityKind::Castle,
                team: castle.team,
                lane: None,
                x,
                y,
                unit_type: None,
                battalion: None,
                health: Some(HealthState {
                    current: castle.health,
                    max: castle.max_health,
                }),
                target: None,
            });
        }
        for tower in &snapshot.towers {
            let (x, y) = point(tower.position);
            entities.push(EntityState {
                id: tower.id,
                kind: EntityKind::Tower,
                team: tower.team,
                lane: tower.lane,
                x,
                y,
                unit_type: None,
                battalion: None,
                health: Some(HealthState {
                    current: tower.health,
                    max: tower.max_health,
                }),
                target: None,
            });
        }
        for catapult in &snapshot.catapults {
            let (x, y) = point(catapult.position);
            entities.push(EntityState {
                id: catapult.id,
                kind: EntityKind::Catapult,
                team: catapult.team,
                lane: Some(catapult.lane),
                x,
                y,
                unit_type: None,
                battalion: None,
                health: Some(HealthState {
                    current: catapult.health,
                    max: catapult.max_health,
                }),
                target: catapult.target.map(|t| t.id),
            });
        }
        for unit in &snapshot.units {
            let (x, y) = point(unit.position);
            entities.push(EntityState {
                id: unit.id,
                kind: EntityKind::Unit,
                team: unit.team,
                lane: Some(unit.lane),
                x,
                y,
                unit_type: Some(unit.unit_type),
                battalion: Some(unit.battalion),
                health: None,
                target: unit.target.map(|t| t.id),
            });
        }

        Self {
            tick: snapshot.tick,
            mana: snapshot.mana,
            mana_cap: snapshot.mana_cap,
            outcome: snapshot.outcome,
            entities,
            hash,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tick_command() {
        let cmd = Command::from_json(r#"{"cmd":"tick","count":60}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 60 });
    }

    #[test]
    fn test_default_tick_count() {
        let cmd = Command::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 1 });
    }

    #[test]
    fn test_parse_deploy_command() {
        let cmd = Command::from_json(r#"{"cmd":"deploy","unit_type":"FireMage","lane":"Left"}"#)
            .unwrap();
        assert_eq!(
            cmd.player_command(),
            Some(PlayerCommand::DeployBattalion {
                unit_type: UnitType::FireMage,
                lane: Lane::Left
            })
        );
        assert_eq!(cmd.name(), "deploy");
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(Command::from_json(r#"{"cmd":"teleport"}"#).is_err());
    }

    #[test]
    fn test_state_output_lists_everything() {
        let rosters = [ArmyRoster::new().with(UnitType::Archer, 1), ArmyRoster::new()];
        let mut battle = Battle::start(BattleConfig::default(), rosters, 100, 1).unwrap();
        battle.deploy_battalion(UnitType::Archer, Lane::Right).unwrap();
        battle.tick();

        let state = StateOutput::from_snapshot(&battle.snapshot(), battle.state_hash());
        let count = |kind| state.entities.iter().filter(|e| e.kind == kind).count();
        assert_eq!(count(EntityKind::Castle), 2);
        assert_eq!(count(EntityKind::Tower), 6);
        assert_eq!(count(EntityKind::Unit), 1);
        assert_eq!(state.tick, 1);

        let json = Response::State(state).to_json_line();
        assert!(json.contains(r#""type":"state""#));
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn test_rejection_serializes_reason() {
        let resp = Response::Rejected {
            cmd: "deploy".to_string(),
            reason: CommandError::InsufficientArmy {
                unit_type: UnitType::Cavalry,
            },
        };
        let json = resp.to_json_line();
        assert!(json.contains(r#""type":"rejected""#));
        assert!(json.contains("Cavalry"));
    }
}
