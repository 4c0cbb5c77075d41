//! Placement (admission control)
//!
//! Decides where a freshly generated order goes. Strict priority:
//!
//! 1. the first idle operator, scanning by ascending id
//! 2. the buffer, if it has a free slot
//! 3. rejection
//!
//! An order is never split across outcomes, and rejection happens if and
//! only if every operator is busy and the buffer is full.

use crate::models::{Buffer, Event, Operator};
use crate::stats::Statistics;
use log::debug;

/// Admission policy for new orders
///
/// # Example
///
/// ```
/// use smo_simulator_core_rs::policy::PlacementDispatcher;
/// use smo_simulator_core_rs::models::{Buffer, EventKind, Operator};
/// use smo_simulator_core_rs::Statistics;
///
/// let dispatcher = PlacementDispatcher::new();
/// let operators = vec![Operator::new(0, 3.0)];
/// let mut buffer = Buffer::new(2);
/// let mut stats = Statistics::new(1);
///
/// let event = dispatcher.admit(&operators, &mut buffer, &mut stats, 0.0, 0, 0);
/// assert_eq!(event.kind(), EventKind::OrderToOperator);
/// assert_eq!(event.operator_id(), Some(0));
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementDispatcher;

impl PlacementDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// First idle operator in slice order
    ///
    /// Operators are stored by ascending id, so this is the lowest idle id.
    pub fn find_free_operator<'a>(&self, operators: &'a [Operator]) -> Option<&'a Operator> {
        operators.iter().find(|op| !op.is_busy())
    }

    /// Route a new order
    ///
    /// Returns exactly one event: `OrderToOperator`, `OrderToBuffer` or
    /// `OrderRejected`. Buffering mutates `buffer`; rejection is recorded in
    /// `statistics` right here, so the `OrderRejected` event needs no
    /// further handling.
    pub fn admit(
        &self,
        operators: &[Operator],
        buffer: &mut Buffer,
        statistics: &mut Statistics,
        time: f64,
        restaurant_id: usize,
        order_id: u64,
    ) -> Event {
        if let Some(operator) = self.find_free_operator(operators) {
            debug!(
                "order {}/{} routed to idle operator {}",
                restaurant_id,
                order_id,
                operator.id()
            );
            return Event::OrderToOperator {
                time,
                restaurant_id,
                order_id,
                operator_id: operator.id(),
            };
        }

        if buffer.try_admit(restaurant_id, order_id, time) {
            // The order was just written, so the lookup cannot miss
            let buffer_position = buffer
                .position_of(restaurant_id, order_id)
                .unwrap_or(buffer.size() - 1);
            debug!(
                "order {}/{} buffered at slot {} ({}/{})",
                restaurant_id,
                order_id,
                buffer_position,
                buffer.size(),
                buffer.capacity()
            );
            return Event::OrderToBuffer {
                time,
                restaurant_id,
                order_id,
                buffer_position,
            };
        }

        debug!(
            "order {}/{} rejected: all operators busy, buffer full",
            restaurant_id, order_id
        );
        statistics.order_rejected(restaurant_id);
        Event::OrderRejected {
            time,
            restaurant_id,
            order_id,
        }
    }
}
