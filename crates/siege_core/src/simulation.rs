//! The battle clock.
//!
//! [`Battle`] owns the [`BattleState`] for the whole battle and is its only
//! writer. Each call to [`Battle::tick`] runs one fixed step and returns the
//! events it produced.
//!
//! # Determinism
//!
//! - No floating-point math in simulation state (fixed-point via [`Fixed`](crate::math::Fixed))
//! - No system randomness; tower casualties come from an injected, seeded source
//! - Every system walks entities in ascending id order
//! - Same config, rosters, seed and commands always produce the same battle
//!
//! # Example
//!
//! ```
//! use siege_core::prelude::*;
//!
//! let rosters = [ArmyRoster::new().with(UnitType::Swordsman, 3), ArmyRoster::new()];
//! let mut battle = Battle::start(BattleConfig::default(), rosters, 100, 42).unwrap();
//!
//! battle
//!     .deploy_battalion(UnitType::Swordsman, Lane::Center)
//!     .unwrap();
//! let events = battle.tick();
//! assert_eq!(battle.current_tick(), 1);
//! assert!(!events.is_empty());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::collaborators::BattleObserver;
use crate::combat::{apply_intents, collect_intents, remove_destroyed, CasualtyRoll, SeededCasualties};
use crate::commands::{deploy_unit, CommandGateway, PlayerCommand};
use crate::components::{EntityId, Lane, Team, UnitType};
use crate::data::BattleConfig;
use crate::error::{CommandError, Result, SiegeError};
use crate::events::{BattleEvent, BattleResult, TickEvents};
use crate::movement::{move_catapults, move_units};
use crate::resources::ArmyRoster;
use crate::snapshot::BattleSnapshot;
use crate::state::{BattleState, Outcome};
use crate::targeting::{catapult_target, resolve_targets};
use crate::victory::evaluate;

/// Ticks per second.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Where the scripted enemy deploys next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct EnemyCursor {
    lane: usize,
    unit_type: usize,
}

/// A running battle.
///
/// # Tick order
///
/// 1. **Boundary** - queued commands, catapult spawns, scripted enemy
///    deployment, mana regeneration
/// 2. **Movement** - toward the target held from the last resolution
/// 3. **Targeting** - every attacker re-resolved from the moved state
/// 4. **Combat** - intents collected, applied with clamping, dead removed
/// 5. **Win check** - castles inspected, outcome fixed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle<R = SeededCasualties> {
    config: BattleConfig,
    state: BattleState,
    gateway: CommandGateway,
    roller: R,
    enemy_cursor: EnemyCursor,
    result: Option<BattleResult>,
}

impl Battle<SeededCasualties> {
    /// Start a battle with seeded tower casualties.
    ///
    /// `rosters` is indexed by team; `initial_mana` is the player's starting
    /// balance, clamped to the configured cap.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidConfig`] if the configuration is unusable.
    pub fn start(
        config: BattleConfig,
        rosters: [ArmyRoster; 2],
        initial_mana: u32,
        seed: u64,
    ) -> Result<Self> {
        Self::with_roller(config, rosters, initial_mana, SeededCasualties::new(seed))
    }
}

impl<R: CasualtyRoll> Battle<R> {
    /// Start a battle with a custom casualty source.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidConfig`] if the configuration is unusable.
    pub fn with_roller(
        config: BattleConfig,
        rosters: [ArmyRoster; 2],
        initial_mana: u32,
        roller: R,
    ) -> Result<Self> {
        config.validate()?;
        let state = BattleState::new(&config, rosters, initial_mana);
        tracing::info!(
            lanes = config.layout.lanes.len(),
            towers = state.towers().len(),
            mana = state.mana().current(),
            "Battle started"
        );
        Ok(Self {
            config,
            state,
            gateway: CommandGateway::new(),
            roller,
            enemy_cursor: EnemyCursor::default(),
            result: None,
        })
    }

    /// The rules this battle runs under.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Read-only access to live state.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Ticks completed.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.state.tick()
    }

    /// Current outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.state.outcome().is_terminal()
    }

    /// Commands queued for the next tick.
    #[must_use]
    pub fn pending_commands(&self) -> &[PlayerCommand] {
        self.gateway.pending()
    }

    /// Validate a player command and queue it for the next tick.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] explaining the rejection. State is
    /// unchanged on rejection.
    pub fn submit(&mut self, command: PlayerCommand) -> std::result::Result<(), CommandError> {
        let outcome = self.gateway.submit(&self.state, &self.config, command);
        if let Err(reason) = &outcome {
            tracing::debug!(tick = self.state.tick(), ?command, %reason, "Command rejected");
        }
        outcome
    }

    /// Queue a battalion deployment.
    ///
    /// # Errors
    ///
    /// See [`Battle::submit`].
    pub fn deploy_battalion(
        &mut self,
        unit_type: UnitType,
        lane: Lane,
    ) -> std::result::Result<(), CommandError> {
        self.submit(PlayerCommand::DeployBattalion { unit_type, lane })
    }

    /// Queue a manual catapult shot.
    ///
    /// # Errors
    ///
    /// See [`Battle::submit`].
    pub fn manual_fire(
        &mut self,
        catapult: EntityId,
        target_lane: Lane,
    ) -> std::result::Result<(), CommandError> {
        self.submit(PlayerCommand::ManualFire {
            catapult,
            target_lane,
        })
    }

    /// Advance the battle by one tick.
    ///
    /// Does nothing once the battle is over.
    pub fn tick(&mut self) -> TickEvents {
        let now = self.state.tick();
        let mut events = TickEvents::new(now);
        if self.is_over() {
            return events;
        }

        // 1. Tick boundary
        events
            .events
            .extend(self.gateway.apply_queued(&mut self.state, &self.config));
        self.run_catapult_spawns(now, &mut events);
        self.run_enemy_script(now, &mut events);
        self.state.mana_mut().regenerate(now);

        // 2. Movement
        move_units(&mut self.state, &self.config);
        move_catapults(&mut self.state);

        // 3. Targeting
        resolve_targets(&self.state).apply(&mut self.state);

        // 4. Combat
        let intents = collect_intents(&self.state, &mut self.roller);
        apply_intents(&mut self.state, &intents);
        let removed = remove_destroyed(&mut self.state);
        for unit in removed.units {
            tracing::debug!(tick = now, id = unit.id, team = ?unit.team, "Battalion wiped out");
            events.push(BattleEvent::UnitDestroyed {
                id: unit.id,
                team: unit.team,
                unit_type: unit.unit_type,
            });
        }
        for tower in removed.towers {
            tracing::debug!(tick = now, id = tower.id, team = ?tower.team, lane = ?tower.lane, "Tower destroyed");
            events.push(BattleEvent::TowerDestroyed {
                id: tower.id,
                team: tower.team,
                lane: tower.lane,
            });
        }
        for catapult in removed.catapults {
            tracing::debug!(tick = now, id = catapult.id, team = ?catapult.team, "Catapult destroyed");
            events.push(BattleEvent::CatapultDestroyed {
                id: catapult.id,
                team: catapult.team,
                lane: catapult.lane,
            });
        }

        // 5. Win check
        let outcome = evaluate(&self.state, self.config.defender());
        self.state.advance_tick();
        if let Outcome::Victory(winner) = outcome {
            self.finish(outcome);
            let stats = self.state.stats();
            tracing::info!(
                ?winner,
                ticks = self.state.tick(),
                player_casualties = stats.casualties[Team::Player.index()],
                enemy_casualties = stats.casualties[Team::Enemy.index()],
                "Battle ended"
            );
            events.push(BattleEvent::BattleEnded {
                winner,
                duration: self.state.tick(),
                casualties: stats.casualties,
            });
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.state.tick(), state_hash = hash, "Battle state hash");
        }

        events
    }

    /// Run ticks until the battle ends or `max_ticks` have run, reporting
    /// each tick to `observer`.
    pub fn run(&mut self, max_ticks: u64, observer: &mut dyn BattleObserver) -> Outcome {
        for _ in 0..max_ticks {
            if self.is_over() {
                break;
            }
            let events = self.tick();
            observer.on_tick(&events);
        }
        self.outcome()
    }

    /// End the battle without a winner.
    ///
    /// Returns `None` if the battle had already ended.
    pub fn abort(&mut self) -> Option<TickEvents> {
        if self.is_over() {
            return None;
        }
        self.gateway.clear();
        self.finish(Outcome::Aborted);
        let duration = self.state.tick();
        tracing::info!(ticks = duration, "Battle aborted");
        let mut events = TickEvents::new(duration);
        events.push(BattleEvent::BattleAborted { duration });
        Some(events)
    }

    /// Take the final result. Returns `Some` exactly once, after the battle ends.
    pub fn take_result(&mut self) -> Option<BattleResult> {
        self.result.take()
    }

    /// Owned view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot::capture(&self.state)
    }

    /// Hash of the battle state and pending commands.
    ///
    /// Two battles fed the same inputs hash equal at every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.state.hash(&mut hasher);
        self.gateway.hash(&mut hasher);
        self.enemy_cursor.hash(&mut hasher);
        hasher.finish()
    }

    fn finish(&mut self, outcome: Outcome) {
        self.state.set_outcome(outcome);
        self.result = Some(BattleResult::new(
            outcome.winner(),
            self.state.tick(),
            self.state.stats(),
            &self.config.rewards,
            self.state.mana().current(),
            self.state.roster(CommandGateway::TEAM).clone(),
        ));
    }

    fn run_catapult_spawns(&mut self, now: u64, events: &mut TickEvents) {
        let interval = self.config.catapult.spawn_interval;
        if interval == 0 || now % interval != 0 {
            return;
        }
        let lanes = self.config.layout.lanes.clone();
        for team in Team::ALL {
            for &lane in &lanes {
                for _ in 0..self.config.catapult.per_lane {
                    let id = self.state.spawn_catapult(&self.config, team, lane);
                    let target = self
                        .state
                        .catapults()
                        .get(id)
                        .and_then(|catapult| catapult_target(&self.state, catapult));
                    if let Some(catapult) = self.state.catapults_mut().get_mut(id) {
                        catapult.target = target;
                    }
                    tracing::debug!(tick = now, id, ?team, ?lane, "Catapult spawned");
                    events.push(BattleEvent::CatapultSpawned { id, team, lane });
                }
            }
        }
    }

    fn run_enemy_script(&mut self, now: u64, events: &mut TickEvents) {
        let script = self.config.enemy;
        if script.spawn_interval == 0
            || now < script.first_spawn
            || (now - script.first_spawn) % script.spawn_interval != 0
        {
            return;
        }

        let roster = self.state.roster(Team::Enemy);
        let count = UnitType::ALL.len();
        let Some(offset) = (0..count).find(|offset| {
            let unit_type = UnitType::ALL[(self.enemy_cursor.unit_type + offset) % count];
            roster.available(unit_type) > 0
        }) else {
            return;
        };
        let type_index = (self.enemy_cursor.unit_type + offset) % count;
        let unit_type = UnitType::ALL[type_index];
        let lanes = &self.config.layout.lanes;
        let lane = lanes[self.enemy_cursor.lane % lanes.len()];

        self.enemy_cursor.unit_type = (type_index + 1) % count;
        self.enemy_cursor.lane = (self.enemy_cursor.lane + 1) % lanes.len();
        self.state.roster_mut(Team::Enemy).take(unit_type);
        events.push(deploy_unit(&mut self.state, &self.config, Team::Enemy, unit_type, lane));
    }
}

impl<R: CasualtyRoll + Serialize + DeserializeOwned> Battle<R> {
    /// Serialize the battle for save or replay.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SiegeError::InvalidState(format!("Failed to serialize battle: {}", e)))
    }

    /// Restore a battle from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SiegeError::InvalidState(format!("Failed to deserialize battle: {}", e)))
    }
}
