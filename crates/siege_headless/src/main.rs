//! Headless siege battle runner.
//!
//! This binary runs battles without graphics, either controlled via JSON on
//! stdin/stdout or played by a built-in strategy.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p siege_headless
//!
//! # Interactive session on a scenario file
//! cargo run -p siege_headless -- run --scenario scenarios/siege.ron
//!
//! # Let a strategy play one battle, streaming events
//! cargo run -p siege_headless -- play --scenario skirmish --strategy rush --ledger results/ledger.jsonl
//!
//! # Run batch balance test
//! cargo run -p siege_headless -- batch --scenario skirmish --count 1000 --output results/
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siege_core::prelude::*;
use siege_headless::{
    batch::{run_batch, verify_determinism, BatchConfig, BatchResults},
    clock::{run_realtime, RealtimeConfig},
    game_runner::{run_game_observed, GameConfig},
    ledger::JsonLedger,
    protocol::Response,
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
    strategies::Strategy,
};

/// Attempts made to persist a result before giving up.
const LEDGER_ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(name = "siege_headless")]
#[command(about = "Headless lane-siege battle runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive battle
    Run {
        /// Scenario name or file to load
        #[arg(short, long)]
        scenario: Option<String>,

        /// Battle seed (defaults to the scenario seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Let a strategy play one battle, printing events as JSON lines
    Play {
        /// Scenario name or file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Strategy name or file
        #[arg(long, default_value = "balanced")]
        strategy: String,

        /// Battle seed (defaults to the scenario seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum ticks before the battle is aborted (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,

        /// Pace the battle to wall-clock time
        #[arg(long)]
        realtime: bool,

        /// Battle seconds per real second when paced
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Append the result to this JSON-lines ledger
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Run batch of battles for balance testing
    Batch {
        /// Scenario to run
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Player strategy
        #[arg(long, default_value = "balanced")]
        strategy: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum ticks per game (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Player strategy
        #[arg(long, default_value = "balanced")]
        strategy: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            auto_state,
        }) => {
            cmd_run(scenario, seed, auto_state);
        }
        Some(Commands::Play {
            scenario,
            strategy,
            seed,
            max_ticks,
            realtime,
            speed,
            ledger,
        }) => {
            let pacing = realtime.then_some(RealtimeConfig {
                speed,
                ..RealtimeConfig::default()
            });
            cmd_play(&scenario, &strategy, seed, max_ticks, pacing, ledger);
        }
        Some(Commands::Batch {
            scenario,
            strategy,
            count,
            parallel,
            output,
            seed,
            max_ticks,
        }) => {
            cmd_batch(&scenario, &strategy, count, parallel, output, seed, max_ticks);
        }
        Some(Commands::Verify {
            scenario,
            strategy,
            seed,
            runs,
        }) => {
            cmd_verify(&scenario, &strategy, seed, runs);
        }
        None => {
            // Default: interactive mode
            cmd_run(None, None, false);
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_inputs(scenario: &str, strategy: &str) -> (Scenario, Strategy) {
    let scenario = Scenario::resolve(scenario)
        .unwrap_or_else(|e| fail(format!("Failed to load scenario '{scenario}': {e}")));
    let strategy = Strategy::resolve(strategy)
        .unwrap_or_else(|e| fail(format!("Failed to load strategy '{strategy}': {e}")));
    (scenario, strategy)
}

/// Run a single interactive battle
fn cmd_run(scenario: Option<String>, seed: Option<u64>, auto_state: bool) {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        scenario_path: scenario,
        seed,
    };

    if let Err(e) = HeadlessRunner::with_config(config).run() {
        fail(format!("Session IO failed: {e}"));
    }
}

/// Writes each tick's events to stdout as protocol lines.
struct EventPrinter<W: Write> {
    out: W,
}

impl<W: Write> BattleObserver for EventPrinter<W> {
    fn on_tick(&mut self, events: &TickEvents) {
        if events.is_empty() {
            return;
        }
        let line = Response::Events {
            tick: events.tick,
            events: events.events.clone(),
        }
        .to_json_line();
        if let Err(e) = self.out.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "Failed to write events");
        }
    }
}

/// Let a strategy play one battle
fn cmd_play(
    scenario: &str,
    strategy: &str,
    seed: Option<u64>,
    max_ticks: u64,
    pacing: Option<RealtimeConfig>,
    ledger: Option<PathBuf>,
) {
    let (scenario, strategy) = load_inputs(scenario, strategy);
    let mut config = GameConfig::new(scenario, strategy);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.max_ticks = max_ticks;

    tracing::info!(
        scenario = %config.scenario.name,
        strategy = %config.strategy.name,
        seed = config.seed,
        realtime = pacing.is_some(),
        "Starting battle"
    );

    let mut printer = EventPrinter {
        out: std::io::stdout(),
    };
    let record = match pacing {
        Some(pacing) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap_or_else(|e| fail(format!("Failed to start runtime: {e}")));
            runtime.block_on(run_realtime(&config, pacing, &mut printer))
        }
        None => run_game_observed(&config, &mut printer),
    }
    .unwrap_or_else(|e| fail(format!("Battle failed: {e}")));

    if let Some(path) = ledger {
        let mut sink = JsonLedger::new(path, config.scenario.name.clone(), config.seed);
        if let Err(e) = deliver_with_retry(&mut sink, &record.result, LEDGER_ATTEMPTS) {
            tracing::warn!(error = %e, path = %sink.path().display(), "Result not persisted");
        }
    }

    let over = Response::BattleOver {
        result: record.result,
    };
    print!("{}", over.to_json_line());
    std::io::stdout().flush().ok();

    eprintln!(
        "Winner: {:?} after {} ticks (commands: {} accepted, {} rejected)",
        record.metrics.winner,
        record.metrics.duration_ticks,
        record.metrics.commands_accepted,
        record.metrics.commands_rejected
    );
}

/// Run batch of battles for balance testing
fn cmd_batch(
    scenario: &str,
    strategy: &str,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_ticks: u64,
) {
    let (scenario, strategy) = load_inputs(scenario, strategy);

    let num_cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario.name,
        strategy = %strategy.name,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        max_ticks = max_ticks,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        fail(format!(
            "Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let mut config = BatchConfig::new(scenario, strategy, count).with_seed(seed);
    config.parallel_games = parallel;
    config.max_ticks = max_ticks;

    let results = run_batch(config);

    let results_path = BatchResults::default_path(&output);
    if let Err(e) = results.save(&results_path) {
        fail(format!("Failed to save results: {e}"));
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} games/sec",
        results.games.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!("\nOutcomes:");
    eprintln!(
        "  Player: {} ({:.1}%)",
        summary.player_wins,
        summary.player_win_rate * 100.0
    );
    eprintln!("  Enemy: {}", summary.enemy_wins);
    eprintln!("  Timed out: {}", summary.timeouts);
    eprintln!("  Avg duration: {:.0} ticks", summary.avg_duration_ticks);

    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Game {} (seed {}): {}",
            error.game_index, error.seed, error.message
        );
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(scenario: &str, strategy: &str, seed: u64, runs: u32) {
    let (scenario, strategy) = load_inputs(scenario, strategy);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    if verify_determinism(&scenario, &strategy, seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}
