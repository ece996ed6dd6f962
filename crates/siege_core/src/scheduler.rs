//! Fixed-step tick scheduling.
//!
//! The core never reads a clock. Callers measure elapsed wall time however
//! they like and feed it to [`FixedStepScheduler::advance`], which answers
//! how many whole ticks are due.

use std::time::Duration;

/// Converts elapsed wall time into a whole number of fixed ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStepScheduler {
    step: Duration,
    accumulator: Duration,
    max_catch_up: u32,
}

impl FixedStepScheduler {
    /// Ticks allowed per call before the backlog is dropped.
    pub const DEFAULT_MAX_CATCH_UP: u32 = 5;

    /// Create a scheduler for `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            step: Duration::from_secs(1) / tick_rate.max(1),
            accumulator: Duration::ZERO,
            max_catch_up: Self::DEFAULT_MAX_CATCH_UP,
        }
    }

    /// Builder: cap on ticks run per call.
    #[must_use]
    pub fn with_max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up.max(1);
        self
    }

    /// Length of one tick.
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Time carried toward the next tick.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Add elapsed time and return how many ticks to run now.
    ///
    /// When more than `max_catch_up` ticks are due the excess backlog is
    /// discarded, so a long stall cannot trigger a burst of catch-up ticks.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut due = 0;
        while self.accumulator >= self.step && due < self.max_catch_up {
            self.accumulator -= self.step;
            due += 1;
        }
        if due == self.max_catch_up && self.accumulator >= self.step {
            tracing::debug!(
                dropped_ms = self.accumulator.as_millis() as u64,
                "Scheduler backlog dropped"
            );
            self.accumulator = Duration::ZERO;
        }
        due
    }

    /// Forget any carried time.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_ticks_only() {
        let mut scheduler = FixedStepScheduler::new(20);
        assert_eq!(scheduler.advance(Duration::from_millis(30)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(30)), 1);
        assert_eq!(scheduler.pending(), Duration::from_millis(10));
    }

    #[test]
    fn test_catch_up_is_clamped() {
        let mut scheduler = FixedStepScheduler::new(20).with_max_catch_up(3);
        assert_eq!(scheduler.advance(Duration::from_secs(10)), 3);
        assert_eq!(scheduler.pending(), Duration::ZERO);
    }

    #[test]
    fn test_step_from_rate() {
        assert_eq!(FixedStepScheduler::new(20).step(), Duration::from_millis(50));
    }
}
