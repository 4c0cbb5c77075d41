//! Arrival generation for restaurants.
//!
//! Each restaurant owns an [`ArrivalSource`] that emits orders on a fixed
//! period. Arrivals are deterministic: the only randomness in the model is the
//! operators' service time.
//!
//! # Key Principles
//!
//! 1. **Periodic**: arrivals happen at `0, interval, 2·interval, ...`
//! 2. **Per-restaurant numbering**: order ids start at 0 for each restaurant
//! 3. **Pure with respect to time**: a source only says when the next order
//!    appears; the simulator decides when to ask
//!
//! # Example
//!
//! ```
//! use smo_simulator_core_rs::arrivals::ArrivalSource;
//!
//! let mut source = ArrivalSource::new(1, 5.0);
//! let first = source.generate_next();
//! let second = source.generate_next();
//!
//! assert_eq!(first.time(), 0.0);
//! assert_eq!(second.time(), 5.0);
//! assert_eq!(second.order_id(), 1);
//! assert_eq!(source.next_generation_time(), 10.0);
//! ```

use crate::models::Event;
use serde::{Deserialize, Serialize};

/// Periodic order generator for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalSource {
    restaurant_id: usize,

    /// Fixed gap between consecutive orders
    interval: f64,

    /// Orders emitted so far; also the id of the next order
    generated_count: u64,

    /// Time stamp of the next order
    next_generation_time: f64,
}

impl ArrivalSource {
    /// Create a source whose first order appears at time zero.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is not a positive finite number.
    pub fn new(restaurant_id: usize, interval: f64) -> Self {
        assert!(
            interval.is_finite() && interval > 0.0,
            "arrival interval must be positive"
        );
        Self {
            restaurant_id,
            interval,
            generated_count: 0,
            next_generation_time: 0.0,
        }
    }

    /// One source per restaurant id in `0..count`
    pub fn for_restaurants(count: usize, interval: f64) -> Vec<Self> {
        (0..count).map(|id| Self::new(id, interval)).collect()
    }

    /// Rebuild a source from checkpointed fields
    pub fn from_snapshot(
        restaurant_id: usize,
        interval: f64,
        generated_count: u64,
        next_generation_time: f64,
    ) -> Self {
        Self {
            restaurant_id,
            interval,
            generated_count,
            next_generation_time,
        }
    }

    /// Emit the next `OrderGenerated` event and advance the schedule.
    ///
    /// The event is stamped with the source's own schedule, not with the
    /// caller's clock.
    pub fn generate_next(&mut self) -> Event {
        let event = Event::OrderGenerated {
            time: self.next_generation_time,
            restaurant_id: self.restaurant_id,
            order_id: self.generated_count,
        };

        self.generated_count += 1;
        self.next_generation_time += self.interval;

        event
    }

    /// Restart numbering and schedule from zero
    pub fn reset(&mut self) {
        self.generated_count = 0;
        self.next_generation_time = 0.0;
    }

    pub fn restaurant_id(&self) -> usize {
        self.restaurant_id
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn generated_count(&self) -> u64 {
        self.generated_count
    }

    pub fn next_generation_time(&self) -> f64 {
        self.next_generation_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "arrival interval must be positive")]
    fn test_zero_interval_panics() {
        ArrivalSource::new(0, 0.0);
    }

    #[test]
    fn test_for_restaurants_assigns_ids() {
        let sources = ArrivalSource::for_restaurants(3, 2.0);
        let ids: Vec<usize> = sources.iter().map(|s| s.restaurant_id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(sources.iter().all(|s| s.interval() == 2.0));
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut source = ArrivalSource::new(0, 4.0);
        source.generate_next();
        source.generate_next();

        source.reset();
        assert_eq!(source.generated_count(), 0);
        assert_eq!(source.next_generation_time(), 0.0);

        let event = source.generate_next();
        assert_eq!(event.order_id(), 0);
        assert_eq!(event.time(), 0.0);
    }
}
