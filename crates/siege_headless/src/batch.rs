//! Batch game runner for balance testing.
//!
//! Runs many seeded battles in parallel using rayon and aggregates win
//! rates and durations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use siege_core::prelude::*;

use crate::game_runner::{run_game, GameConfig, GameMetrics};
use crate::scenario::Scenario;
use crate::strategies::Strategy;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to run
    pub scenario: Scenario,
    /// Player strategy
    pub strategy: Strategy,
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Starting seed; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum ticks per game (0 = scenario limit)
    pub max_ticks: u64,
}

impl BatchConfig {
    /// Create config for a scenario and strategy
    pub fn new(scenario: Scenario, strategy: Strategy, game_count: u32) -> Self {
        Self {
            scenario,
            strategy,
            game_count,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: 0,
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    fn game(&self, index: u32) -> GameConfig {
        let mut game = GameConfig::new(self.scenario.clone(), self.strategy.clone())
            .with_seed(self.seed_start.wrapping_add(u64::from(index)));
        game.max_ticks = self.max_ticks;
        game
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games that finished.
    pub total_games: u32,
    /// Player victories.
    pub player_wins: u32,
    /// Enemy victories.
    pub enemy_wins: u32,
    /// Games stopped at the tick limit.
    pub timeouts: u32,
    /// Player wins / total games.
    pub player_win_rate: f64,
    /// Mean battle length in ticks.
    pub avg_duration_ticks: f64,
    /// Mean enemy towers destroyed per game.
    pub avg_towers_destroyed: f64,
}

impl BatchSummary {
    /// Summarize finished games.
    pub fn from_games(games: &[GameMetrics]) -> Self {
        let total = games.len();
        if total == 0 {
            return Self::default();
        }
        let count = |winner: Option<Team>| {
            u32::try_from(games.iter().filter(|g| g.winner == winner).count()).unwrap_or(u32::MAX)
        };
        let player_wins = count(Some(Team::Player));
        let n = total as f64;
        Self {
            total_games: u32::try_from(total).unwrap_or(u32::MAX),
            player_wins,
            enemy_wins: count(Some(Team::Enemy)),
            timeouts: count(None),
            player_win_rate: f64::from(player_wins) / n,
            avg_duration_ticks: games.iter().map(|g| g.duration_ticks as f64).sum::<f64>() / n,
            avg_towers_destroyed: games
                .iter()
                .map(|g| f64::from(g.towers_destroyed))
                .sum::<f64>()
                / n,
        }
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Default results file inside an output directory
    pub fn default_path(output_dir: &Path) -> PathBuf {
        output_dir.join("batch_results.json")
    }
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        scenario = %config.scenario.name,
        strategy = %config.strategy.name,
        games = config.game_count,
        "Starting batch run"
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let game = config.game(i);
            match run_game(&game) {
                Ok(record) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(record.metrics)
                }
                Err(e) => {
                    warn!("Game {} failed: {}", i, e);
                    Err(BatchError {
                        game_index: i,
                        seed: game.seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let mut games = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(metrics) => games.push(metrics),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s, player win rate {:.1}%",
        games.len(),
        duration_seconds,
        summary.player_win_rate * 100.0
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed multiple times
pub fn verify_determinism(scenario: &Scenario, strategy: &Strategy, seed: u64, runs: u32) -> bool {
    let game = GameConfig::new(scenario.clone(), strategy.clone()).with_seed(seed);
    let results: Vec<Option<GameMetrics>> = (0..runs.max(2))
        .map(|_| run_game(&game).ok().map(|record| record.metrics))
        .collect();

    results.windows(2).all(|w| w[0].is_some() && w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_arena() -> BatchConfig {
        let mut config = BatchConfig::new(Scenario::arena(), Strategy::rush(), 6).with_seed(100);
        config.max_ticks = 600;
        config
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(short_arena());

        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        assert_eq!(
            results.summary.player_wins + results.summary.enemy_wins + results.summary.timeouts,
            6
        );
    }

    #[test]
    fn test_games_keep_seed_order() {
        let results = run_batch(short_arena());
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_is_reproducible() {
        let first = run_batch(short_arena());
        let second = run_batch(short_arena());
        assert_eq!(first.games, second.games);
    }

    #[test]
    fn test_summary_rates() {
        let game = |winner, ticks| GameMetrics {
            seed: 0,
            winner,
            duration_ticks: ticks,
            casualties: [0, 0],
            towers_destroyed: 1,
            rewards: 0,
            commands_accepted: 0,
            commands_rejected: 0,
            final_state_hash: 0,
        };
        let summary = BatchSummary::from_games(&[
            game(Some(Team::Player), 100),
            game(Some(Team::Enemy), 200),
            game(Some(Team::Player), 300),
            game(None, 400),
        ]);
        assert_eq!(summary.player_wins, 2);
        assert_eq!(summary.timeouts, 1);
        assert!((summary.player_win_rate - 0.5).abs() < f64::EPSILON);
        assert!((summary.avg_duration_ticks - 250.0).abs() < f64::EPSILON);
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&Scenario::arena(), &Strategy::rush(), 12345, 3));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(short_arena());

        let dir = tempfile::tempdir().unwrap();
        let path = BatchResults::default_path(dir.path());

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.scenario, Scenario::arena());
    }
}
