//! Runs one battle to completion with a scripted player.
//!
//! The plain loop here ticks as fast as possible; see [`crate::clock`] for
//! wall-clock pacing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use siege_core::prelude::*;

use crate::scenario::{Scenario, ScenarioError};
use crate::strategies::{Strategy, StrategyState};

/// Everything needed to run one game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Scenario to play.
    pub scenario: Scenario,
    /// Player strategy.
    pub strategy: Strategy,
    /// Battle seed.
    pub seed: u64,
    /// Abort after this many ticks (0 = scenario limit, then unlimited).
    pub max_ticks: u64,
}

impl GameConfig {
    /// Play `scenario` with `strategy` using the scenario's own seed and limit.
    pub fn new(scenario: Scenario, strategy: Strategy) -> Self {
        let seed = scenario.seed;
        Self {
            scenario,
            strategy,
            seed,
            max_ticks: 0,
        }
    }

    /// Override the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Tick limit actually applied.
    pub fn tick_limit(&self) -> u64 {
        match (self.max_ticks, self.scenario.max_ticks) {
            (0, 0) => u64::MAX,
            (0, scenario) => scenario,
            (limit, _) => limit,
        }
    }
}

/// Summary of one finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Seed the game ran with.
    pub seed: u64,
    /// Winner, or `None` if the game hit its time limit.
    pub winner: Option<Team>,
    /// Ticks played.
    pub duration_ticks: u64,
    /// Soldiers lost per team.
    pub casualties: [u32; 2],
    /// Enemy towers destroyed.
    pub towers_destroyed: u32,
    /// Gold credited to the player.
    pub rewards: u32,
    /// Player commands accepted by the gateway.
    pub commands_accepted: u32,
    /// Player commands rejected at submission or at the tick boundary.
    pub commands_rejected: u32,
    /// State hash after the last tick.
    pub final_state_hash: u64,
}

/// A finished game: metrics plus the full result record.
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Summary numbers.
    pub metrics: GameMetrics,
    /// Result handed to collaborators.
    pub result: BattleResult,
}

/// Submit strategy and script commands for the current tick.
///
/// Returns `(accepted, rejected)`.
pub fn issue_commands(
    battle: &mut Battle,
    scenario: &Scenario,
    strategy: &Strategy,
    cursor: &mut StrategyState,
) -> (u32, u32) {
    let now = battle.current_tick();
    let mut commands: Vec<PlayerCommand> = scenario.commands_at(now).collect();
    commands.extend(strategy.decide(&*battle, cursor));

    let mut accepted = 0;
    let mut rejected = 0;
    for command in commands {
        match battle.submit(command) {
            Ok(()) => accepted += 1,
            Err(reason) => {
                debug!(tick = now, ?command, %reason, "Player command rejected");
                rejected += 1;
            }
        }
    }
    (accepted, rejected)
}

/// Run a game to completion, reporting every tick to `observer`.
///
/// A game that reaches its tick limit is aborted and recorded without a
/// winner.
pub fn run_game_observed(
    config: &GameConfig,
    observer: &mut dyn BattleObserver,
) -> Result<GameRecord, ScenarioError> {
    let mut battle = config.scenario.start_battle(config.seed)?;
    let mut cursor = StrategyState::default();
    let limit = config.tick_limit();
    let mut counts = CommandCounts::default();

    while !battle.is_over() && battle.current_tick() < limit {
        let events = play_tick(&mut battle, config, &mut cursor, &mut counts);
        observer.on_tick(&events);
    }

    finish_game(battle, config, counts, observer)
}

/// Accepted and rejected player commands over a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounts {
    /// Accepted at submission.
    pub accepted: u32,
    /// Rejected at submission or at the tick boundary.
    pub rejected: u32,
}

/// Issue this tick's player commands, then run the tick.
pub fn play_tick(
    battle: &mut Battle,
    config: &GameConfig,
    cursor: &mut StrategyState,
    counts: &mut CommandCounts,
) -> TickEvents {
    let (accepted, rejected) = issue_commands(battle, &config.scenario, &config.strategy, cursor);
    counts.accepted += accepted;
    counts.rejected += rejected;

    let events = battle.tick();
    let late = events
        .events
        .iter()
        .filter(|e| matches!(e, BattleEvent::CommandRejected { .. }))
        .count();
    counts.rejected += u32::try_from(late).unwrap_or(u32::MAX);
    events
}

/// Abort a battle that is still running, then collect its result.
pub fn finish_game(
    mut battle: Battle,
    config: &GameConfig,
    counts: CommandCounts,
    observer: &mut dyn BattleObserver,
) -> Result<GameRecord, ScenarioError> {
    if let Some(events) = battle.abort() {
        info!(seed = config.seed, ticks = battle.current_tick(), "Tick limit reached");
        observer.on_tick(&events);
    }

    let result = battle
        .take_result()
        .ok_or_else(|| SiegeError::InvalidState("finished battle has no result".into()))?;
    let metrics = GameMetrics {
        seed: config.seed,
        winner: result.winner,
        duration_ticks: result.elapsed_ticks,
        casualties: result.casualties,
        towers_destroyed: result.towers_destroyed,
        rewards: result.rewards,
        commands_accepted: counts.accepted,
        commands_rejected: counts.rejected,
        final_state_hash: battle.state_hash(),
    };
    Ok(GameRecord { metrics, result })
}

/// Run a game to completion without observing events.
pub fn run_game(config: &GameConfig) -> Result<GameRecord, ScenarioError> {
    let mut discard = NullObserver;
    run_game_observed(config, &mut discard)
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BattleObserver for NullObserver {
    fn on_tick(&mut self, _events: &TickEvents) {}
}
