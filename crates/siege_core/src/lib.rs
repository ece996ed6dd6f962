//! # Siege Core
//!
//! Deterministic lane-siege battle simulation.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (tower casualties come from a seeded, injected source)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Save/restore of running battles
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`components`] - Teams, lanes, health, battalions, cooldowns
//! - [`entities`] - Unit, tower, catapult and castle records
//! - [`state`] - The battle state aggregate
//! - [`spatial`] - Distance and range queries
//! - [`targeting`] - Target resolution policy
//! - [`movement`] - Unit and catapult movement
//! - [`combat`] - Damage, attrition and removal
//! - [`victory`] - Win condition evaluation
//! - [`commands`] - Player command gateway
//! - [`simulation`] - The battle clock
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod collaborators;
pub mod combat;
pub mod commands;
pub mod components;
pub mod data;
pub mod entities;
pub mod error;
pub mod events;
pub mod math;
pub mod movement;
pub mod resources;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod spatial;
pub mod state;
pub mod targeting;
pub mod victory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::collaborators::{deliver_with_retry, BattleObserver, ResultSink, SinkError};
    pub use crate::combat::{CasualtyRoll, FixedCasualties, SeededCasualties};
    pub use crate::commands::PlayerCommand;
    pub use crate::components::*;
    pub use crate::data::{BattleConfig, LayoutData, UnitCatalog};
    pub use crate::error::{CommandError, Result, SiegeError};
    pub use crate::events::{BattleEvent, BattleResult, TickEvents};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::resources::{ArmyRoster, ManaGate};
    pub use crate::scheduler::FixedStepScheduler;
    pub use crate::simulation::{Battle, TICK_RATE};
    pub use crate::snapshot::BattleSnapshot;
    pub use crate::state::{BattleState, Outcome};
}
