//! Headless battle runner for scripted play, balance testing and CI.
//!
//! This crate runs lane-siege battles without graphics. It can be:
//!
//! - **Controlled interactively**: JSON commands on stdin, events and state on stdout
//! - **Played by a strategy**: a scripted player against the enemy script
//! - **Run in bulk**: many seeds in parallel for win-rate statistics
//! - **Paced to wall-clock time**: for watching a battle unfold
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, deploy, fire, etc.)
//! - **stdout**: Events, state and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p siege_headless
//!
//! # Play a scenario with a built-in strategy, paced at 4x speed
//! cargo run -p siege_headless -- play --scenario siege --strategy artillery --realtime --speed 4
//!
//! # Batch balance run
//! cargo run -p siege_headless -- batch --scenario skirmish --count 500 --output results/
//! ```

pub mod batch;
pub mod clock;
pub mod game_runner;
pub mod ledger;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod strategies;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use clock::{run_realtime, RealtimeConfig};
pub use game_runner::{run_game, GameConfig, GameMetrics, GameRecord};
pub use ledger::JsonLedger;
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::Scenario;
pub use strategies::Strategy;
