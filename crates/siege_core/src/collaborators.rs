//! Interfaces to the systems around a battle.
//!
//! Observers (progress tracking, tutorials) see events but cannot change
//! the battle. Result sinks (economy, persistence) receive the final record
//! once. A failing sink never rolls back the outcome; delivery is retried a
//! bounded number of times and each failure is logged.

use thiserror::Error;

use crate::events::{BattleEvent, BattleResult, TickEvents};

/// Receives the events of every tick.
pub trait BattleObserver {
    /// Called once per tick with that tick's events.
    fn on_tick(&mut self, events: &TickEvents);
}

impl BattleObserver for Vec<BattleEvent> {
    fn on_tick(&mut self, events: &TickEvents) {
        self.extend(events.events.iter().cloned());
    }
}

/// Failure reported by a result sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not be reached or written.
    #[error("Result sink unavailable: {0}")]
    Unavailable(String),

    /// The sink rejected the record.
    #[error("Result rejected: {0}")]
    Rejected(String),

    /// IO failure while persisting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumes the final battle record.
pub trait ResultSink {
    /// Credit or persist the result.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the record could not be accepted.
    fn deliver(&mut self, result: &BattleResult) -> Result<(), SinkError>;
}

/// Deliver a result, retrying up to `attempts` times.
///
/// Returns the last error if every attempt failed.
///
/// # Errors
///
/// Returns the final [`SinkError`] once all attempts are exhausted.
pub fn deliver_with_retry(
    sink: &mut dyn ResultSink,
    result: &BattleResult,
    attempts: u32,
) -> Result<(), SinkError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match sink.deliver(result) {
            Ok(()) => return Ok(()),
            Err(err) if attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %err, "Result delivery failed, retrying");
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempts, error = %err, "Result delivery failed");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ArmyRoster;

    struct FlakySink {
        failures_left: u32,
        delivered: Vec<BattleResult>,
    }

    impl ResultSink for FlakySink {
        fn deliver(&mut self, result: &BattleResult) -> Result<(), SinkError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(SinkError::Unavailable("ledger offline".into()));
            }
            self.delivered.push(result.clone());
            Ok(())
        }
    }

    fn result() -> BattleResult {
        BattleResult {
            winner: None,
            elapsed_ticks: 12,
            casualties: [0, 0],
            towers_destroyed: 0,
            rewards: 0,
            mana_remaining: 30,
            army_returned: ArmyRoster::new(),
        }
    }

    #[test]
    fn test_retry_until_success() {
        let mut sink = FlakySink {
            failures_left: 2,
            delivered: Vec::new(),
        };
        assert!(deliver_with_retry(&mut sink, &result(), 3).is_ok());
        assert_eq!(sink.delivered.len(), 1);
    }

    #[test]
    fn test_retry_gives_up() {
        let mut sink = FlakySink {
            failures_left: 5,
            delivered: Vec::new(),
        };
        assert!(matches!(
            deliver_with_retry(&mut sink, &result(), 3),
            Err(SinkError::Unavailable(_))
        ));
        assert_eq!(sink.failures_left, 2);
    }
}
