//! Virtual clock for the event-driven simulation
//!
//! Time never advances in fixed increments. The clock jumps straight to the
//! timestamp of each event popped from the calendar, so it only moves forward
//! when something happens.

use serde::{Deserialize, Serialize};

/// Tracks virtual time and the number of processed steps
///
/// # Example
/// ```
/// use smo_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.current_time(), 0.0);
///
/// clock.advance_to(2.5);
/// assert_eq!(clock.current_time(), 2.5);
/// assert_eq!(clock.step_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Virtual time of the most recently processed event
    current_time: f64,
    /// Number of calendar events processed since the last reset
    step_count: u64,
}

impl SimClock {
    /// Create a clock at time zero with no processed steps
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a clock from checkpointed values
    pub fn from_parts(current_time: f64, step_count: u64) -> Self {
        Self {
            current_time,
            step_count,
        }
    }

    /// Move the clock to the time of the next processed event
    ///
    /// Counts one step per call.
    ///
    /// # Panics
    /// Panics if `time` lies before the current time. The calendar hands out
    /// events in non-decreasing order, so a regression means the engine's
    /// bookkeeping is broken.
    pub fn advance_to(&mut self, time: f64) {
        assert!(
            time >= self.current_time,
            "clock regression: event at {} precedes current time {}",
            time,
            self.current_time
        );
        self.current_time = time;
        self.step_count += 1;
    }

    /// Current virtual time
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Number of processed calendar events
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Return to time zero
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.step_count = 0;
    }
}
