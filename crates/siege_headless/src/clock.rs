//! Wall-clock pacing for watched battles.
//!
//! A tokio interval wakes the loop; a [`FixedStepScheduler`] turns the real
//! time that passed into whole ticks, so a late wake-up catches up (within
//! the scheduler's clamp) instead of slowing the battle down.

use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use siege_core::prelude::*;

use crate::game_runner::{finish_game, play_tick, CommandCounts, GameConfig, GameRecord};
use crate::scenario::ScenarioError;
use crate::strategies::StrategyState;

/// Pacing options for a real-time run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealtimeConfig {
    /// Battle seconds per wall-clock second.
    pub speed: f64,
    /// Most ticks run after a single wake-up.
    pub max_catch_up: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_catch_up: FixedStepScheduler::DEFAULT_MAX_CATCH_UP,
        }
    }
}

impl RealtimeConfig {
    /// Wall-clock time between wake-ups.
    pub fn wake_period(&self) -> Duration {
        let speed = if self.speed > 0.0 { self.speed } else { 1.0 };
        Duration::from_secs_f64(1.0 / (f64::from(TICK_RATE) * speed))
    }
}

/// Run a game paced to wall-clock time, reporting each tick to `observer`.
///
/// Produces the same record as [`run_game_observed`](crate::game_runner::run_game_observed)
/// for the same config; only the pacing differs.
pub async fn run_realtime(
    config: &GameConfig,
    pacing: RealtimeConfig,
    observer: &mut dyn BattleObserver,
) -> Result<GameRecord, ScenarioError> {
    let mut battle = config.scenario.start_battle(config.seed)?;
    let mut cursor = StrategyState::default();
    let mut counts = CommandCounts::default();
    let mut scheduler = FixedStepScheduler::new(TICK_RATE).with_max_catch_up(pacing.max_catch_up);
    let limit = config.tick_limit();

    let mut wake = interval(pacing.wake_period());
    wake.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    info!(seed = config.seed, speed = pacing.speed, "Real-time battle started");
    while !battle.is_over() && battle.current_tick() < limit {
        wake.tick().await;
        let now = Instant::now();
        let elapsed = now
            .duration_since(last)
            .mul_f64(pacing.speed.max(f64::EPSILON));
        last = now;

        let due = scheduler.advance(elapsed);
        if due > 1 {
            debug!(ticks = due, "Catching up after late wake-up");
        }
        for _ in 0..due {
            if battle.is_over() || battle.current_tick() >= limit {
                break;
            }
            let events = play_tick(&mut battle, config, &mut cursor, &mut counts);
            observer.on_tick(&events);
        }
    }

    finish_game(battle, config, counts, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_runner::run_game;
    use crate::scenario::Scenario;
    use crate::strategies::Strategy;

    #[test]
    fn test_wake_period_scales_with_speed() {
        let normal = RealtimeConfig::default();
        assert_eq!(normal.wake_period(), Duration::from_millis(50));
        let fast = RealtimeConfig {
            speed: 10.0,
            ..RealtimeConfig::default()
        };
        assert_eq!(fast.wake_period(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_realtime_matches_fast_run() {
        let mut config = GameConfig::new(Scenario::arena(), Strategy::rush()).with_seed(8);
        config.max_ticks = 100;
        let pacing = RealtimeConfig {
            speed: 40.0,
            ..RealtimeConfig::default()
        };

        let fast = run_game(&config).unwrap().metrics;
        let mut log: Vec<BattleEvent> = Vec::new();
        let paced = run_realtime(&config, pacing, &mut log).await.unwrap();

        assert_eq!(paced.metrics, fast);
        assert!(log.iter().any(|e| matches!(e, BattleEvent::UnitSpawned { .. })));
    }
}
