//! Error types for the battle simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{EntityId, Lane, Team, UnitType};

/// Result type alias defaulting to [`SiegeError`].
pub type Result<T, E = SiegeError> = std::result::Result<T, E>;

/// Top-level error type for simulation state and data errors.
#[derive(Debug, Error)]
pub enum SiegeError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Data file parsing error.
    #[error("Failed to parse data: {message}")]
    DataParseError {
        /// Error message.
        message: String,
    },

    /// Layout or catalog values that cannot produce a valid battle.
    #[error("Invalid battle configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}

/// Typed rejection returned by the command gateway.
///
/// A rejected command never mutates battle state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// The resource gate holds less mana than the command costs.
    #[error("Insufficient mana: need {required}, have {available}")]
    InsufficientResource {
        /// Mana required.
        required: u32,
        /// Mana available after pending reservations.
        available: u32,
    },

    /// No battalion of the requested type is left in the army roster.
    #[error("No {unit_type:?} battalions available")]
    InsufficientArmy {
        /// Requested unit type.
        unit_type: UnitType,
    },

    /// The attacker is still reloading.
    #[error("Entity {entity} is not ready: {ticks_remaining} ticks remaining")]
    NotReady {
        /// Entity that was asked to act.
        entity: EntityId,
        /// Ticks until the entity can act again.
        ticks_remaining: u64,
    },

    /// No friendly entity with this id exists.
    #[error("Unknown entity {entity} for team {team:?}")]
    UnknownEntity {
        /// Requested entity id.
        entity: EntityId,
        /// Team that issued the command.
        team: Team,
    },

    /// The command names a lane the layout does not use.
    #[error("Lane {lane:?} is not in play")]
    InvalidLane {
        /// Requested lane.
        lane: Lane,
    },

    /// The battle has a terminal outcome and accepts no further commands.
    #[error("Battle is over")]
    BattleOver,
}
