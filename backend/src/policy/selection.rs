//! Selection (resumption with batching)
//!
//! When an operator frees up, the selection dispatcher picks the next buffered
//! order to serve. Orders are drained in *batches*: once a restaurant's batch
//! starts, every buffered order of that restaurant is served, oldest first,
//! before any other restaurant gets a turn. Orders of other restaurants that
//! arrive meanwhile simply wait.
//!
//! # Batch rules
//!
//! - A new batch goes to the lowest restaurant id present in the buffer.
//! - The batch is re-derived from the live buffer on every selection, so the
//!   cached list can never point at a slot that has since been compacted.
//! - New orders of the *active* restaurant join the running batch; the batch
//!   only switches once that restaurant has nothing left in the buffer.
//!
//! Selection does not remove anything from the buffer. The simulator removes
//! the order when it hands it to an operator and then calls
//! [`SelectionDispatcher::buffer_compacted`] to keep the cache aligned. When
//! admission buffers an order it calls [`SelectionDispatcher::order_buffered`],
//! so the reported batch size includes absorbed arrivals.

use crate::models::{Buffer, Event, Order};
use log::debug;
use serde::{Deserialize, Serialize};

/// Batch-aware selection policy
///
/// # Example
///
/// ```
/// use smo_simulator_core_rs::policy::SelectionDispatcher;
/// use smo_simulator_core_rs::Buffer;
///
/// let mut buffer = Buffer::new(4);
/// buffer.try_admit(1, 0, 0.0);
/// buffer.try_admit(0, 0, 1.0);
/// buffer.try_admit(1, 1, 2.0);
///
/// let mut selection = SelectionDispatcher::new();
/// let event = selection.select_next(&buffer, 5.0).unwrap();
///
/// // Restaurant 0 has the lowest id, so its batch goes first
/// assert_eq!(event.restaurant_id(), 0);
/// assert_eq!(event.buffer_position(), Some(1));
/// assert_eq!(event.wait_time(), Some(4.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionDispatcher {
    /// Restaurant whose batch is being drained
    current_restaurant: Option<usize>,

    /// Orders of the current batch not yet selected, in slot order
    package: Vec<(usize, Order)>,
}

impl SelectionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from checkpointed state
    pub fn from_snapshot(current_restaurant: Option<usize>, package: Vec<(usize, Order)>) -> Self {
        Self {
            current_restaurant,
            package,
        }
    }

    /// Pick the next buffered order to serve
    ///
    /// Returns an `OrderSelected` event without an operator; the caller fills
    /// in the operator that takes the order. Returns `None` and drops the
    /// batch when the buffer is empty.
    pub fn select_next(&mut self, buffer: &Buffer, time: f64) -> Option<Event> {
        if buffer.is_empty() {
            self.reset();
            return None;
        }

        let mut package = self
            .current_restaurant
            .map(|restaurant_id| buffer.orders_of(restaurant_id))
            .unwrap_or_default();

        if package.is_empty() {
            let restaurant_id = buffer.lowest_restaurant()?;
            debug!(
                "batch switch at t={:.3}: {:?} -> restaurant {}",
                time, self.current_restaurant, restaurant_id
            );
            self.current_restaurant = Some(restaurant_id);
            package = buffer.orders_of(restaurant_id);
        }

        let (buffer_position, order) = package.remove(0);
        self.package = package;

        Some(Event::OrderSelected {
            time,
            restaurant_id: order.restaurant_id(),
            order_id: order.order_id(),
            buffer_position,
            wait_time: order.wait_time(time),
            operator_id: None,
        })
    }

    /// Shift cached positions after the buffer removed `position`
    pub fn buffer_compacted(&mut self, position: usize) {
        self.package.retain(|(p, _)| *p != position);
        for (p, _) in self.package.iter_mut() {
            if *p > position {
                *p -= 1;
            }
        }
    }

    /// Absorb a newly buffered order of the active restaurant into the batch
    pub fn order_buffered(&mut self, buffer: &Buffer, restaurant_id: usize) {
        if self.current_restaurant == Some(restaurant_id) {
            self.package = buffer.orders_of(restaurant_id);
        }
    }

    /// Active batch restaurant and the number of its orders still waiting
    pub fn current_batch_info(&self) -> (Option<usize>, usize) {
        (self.current_restaurant, self.package.len())
    }

    pub fn current_restaurant(&self) -> Option<usize> {
        self.current_restaurant
    }

    /// Cached batch entries as `(position, order)`
    pub fn package(&self) -> &[(usize, Order)] {
        &self.package
    }

    /// Forget the active batch
    pub fn reset(&mut self) {
        self.current_restaurant = None;
        self.package.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_clears_batch() {
        let mut selection =
            SelectionDispatcher::from_snapshot(Some(2), vec![(0, Order::new(2, 0, 0.0))]);
        assert!(selection.select_next(&Buffer::new(2), 1.0).is_none());
        assert_eq!(selection.current_batch_info(), (None, 0));
    }

    #[test]
    fn test_batch_info_counts_remaining() {
        let mut buffer = Buffer::new(4);
        buffer.try_admit(0, 0, 0.0);
        buffer.try_admit(0, 1, 1.0);
        buffer.try_admit(0, 2, 2.0);

        let mut selection = SelectionDispatcher::new();
        selection.select_next(&buffer, 3.0).unwrap();
        assert_eq!(selection.current_batch_info(), (Some(0), 2));
    }

    #[test]
    fn test_order_buffered_only_grows_active_batch() {
        let mut buffer = Buffer::new(4);
        buffer.try_admit(0, 0, 0.0);

        let mut selection = SelectionDispatcher::new();
        selection.select_next(&buffer, 1.0).unwrap();
        buffer.remove_at(0).unwrap();
        selection.buffer_compacted(0);

        buffer.try_admit(1, 0, 1.5);
        selection.order_buffered(&buffer, 1);
        assert_eq!(selection.current_batch_info(), (Some(0), 0));

        buffer.try_admit(0, 1, 2.0);
        selection.order_buffered(&buffer, 0);
        assert_eq!(selection.current_batch_info(), (Some(0), 1));
        assert_eq!(selection.package()[0].0, 1);
    }

    #[test]
    fn test_buffer_compacted_shifts_positions() {
        let mut buffer = Buffer::new(4);
        buffer.try_admit(0, 0, 0.0);
        buffer.try_admit(1, 0, 0.5);
        buffer.try_admit(0, 1, 1.0);

        let mut selection = SelectionDispatcher::new();
        let event = selection.select_next(&buffer, 2.0).unwrap();
        let position = event.buffer_position().unwrap();
        buffer.remove_at(position).unwrap();
        selection.buffer_compacted(position);

        assert_eq!(selection.package()[0].0, 1);
        assert_eq!(buffer.slots()[1].unwrap().order_id(), 1);
    }
}
