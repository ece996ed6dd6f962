//! Discrete battle events and the final result record.
//!
//! Events carry enough data for a log line or toast on their own; no
//! snapshot diff is needed to interpret them.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Lane, Team, UnitType};
use crate::data::RewardTable;
use crate::error::CommandError;
use crate::resources::ArmyRoster;
use crate::state::BattleStats;

/// Something notable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A battalion entered the field.
    UnitSpawned {
        /// New unit id.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Catalog type.
        unit_type: UnitType,
        /// Lane deployed on.
        lane: Lane,
    },
    /// A catapult entered the field.
    CatapultSpawned {
        /// New catapult id.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Lane it advances on.
        lane: Lane,
    },
    /// A battalion was wiped out.
    UnitDestroyed {
        /// Removed unit id.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Catalog type.
        unit_type: UnitType,
    },
    /// A tower fell.
    TowerDestroyed {
        /// Removed tower id.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Lane it guarded.
        lane: Lane,
    },
    /// A catapult was broken.
    CatapultDestroyed {
        /// Removed catapult id.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Lane it was on.
        lane: Lane,
    },
    /// A player fired a catapult manually.
    ManualShot {
        /// Catapult that fired.
        catapult: EntityId,
        /// Structure struck, if any was left standing.
        target: Option<EntityId>,
        /// Damage dealt after clamping.
        damage: u32,
    },
    /// A queued command failed re-validation at the tick boundary.
    CommandRejected {
        /// Why it failed.
        reason: CommandError,
    },
    /// A castle fell and the battle is over.
    BattleEnded {
        /// Winning team.
        winner: Team,
        /// Ticks elapsed.
        duration: u64,
        /// Soldiers lost, indexed by team.
        casualties: [u32; 2],
    },
    /// The battle was ended externally without a winner.
    BattleAborted {
        /// Ticks elapsed.
        duration: u64,
    },
}

/// Events produced by one tick, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick these events belong to.
    pub tick: u64,
    /// Events in occurrence order.
    pub events: Vec<BattleEvent>,
}

impl TickEvents {
    /// Create an empty batch for a tick.
    #[must_use]
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            events: Vec::new(),
        }
    }

    /// Record an event.
    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Check if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether this batch ends the battle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.events.iter().any(|event| {
            matches!(
                event,
                BattleEvent::BattleEnded { .. } | BattleEvent::BattleAborted { .. }
            )
        })
    }
}

/// Final record handed to the economy and persistence collaborators once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    /// Winning team; `None` if the battle was aborted.
    pub winner: Option<Team>,
    /// Ticks elapsed.
    pub elapsed_ticks: u64,
    /// Soldiers lost, indexed by team.
    pub casualties: [u32; 2],
    /// Enemy towers destroyed by the player.
    pub towers_destroyed: u32,
    /// Gold credited to the player.
    pub rewards: u32,
    /// Player mana left over.
    pub mana_remaining: u32,
    /// Undeployed player battalions returned to the economy.
    pub army_returned: ArmyRoster,
}

impl BattleResult {
    /// Build the record from final statistics.
    #[must_use]
    pub fn new(
        winner: Option<Team>,
        elapsed_ticks: u64,
        stats: &BattleStats,
        table: &RewardTable,
        mana_remaining: u32,
        army_returned: ArmyRoster,
    ) -> Self {
        let towers_destroyed = stats.towers_lost[Team::Enemy.index()];
        Self {
            winner,
            elapsed_ticks,
            casualties: stats.casualties,
            towers_destroyed,
            rewards: rewards_for(winner, towers_destroyed, table),
            mana_remaining,
            army_returned,
        }
    }
}

/// Gold earned by the player for an outcome.
///
/// An aborted battle pays only the tower bounty.
#[must_use]
pub fn rewards_for(winner: Option<Team>, towers_destroyed: u32, table: &RewardTable) -> u32 {
    let base = match winner {
        Some(Team::Player) => table.victory,
        Some(Team::Enemy) => table.defeat,
        None => 0,
    };
    base.saturating_add(towers_destroyed.saturating_mul(table.per_tower))
}
