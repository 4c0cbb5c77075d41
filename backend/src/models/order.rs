//! Order model
//!
//! A customer order emitted by a restaurant. It only exists as an object
//! while it waits in the buffer; orders routed straight to an operator are
//! tracked through the operator's assignment instead.

use serde::{Deserialize, Serialize};

/// A buffered order
///
/// # Example
/// ```
/// use smo_simulator_core_rs::Order;
///
/// let order = Order::new(2, 17, 35.0);
/// assert_eq!(order.restaurant_id(), 2);
/// assert_eq!(order.wait_time(40.0), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    restaurant_id: usize,
    /// Sequence number within the restaurant, starting at 0
    order_id: u64,
    /// Virtual time at which the order entered the system
    arrival_time: f64,
}

impl Order {
    pub fn new(restaurant_id: usize, order_id: u64, arrival_time: f64) -> Self {
        Self {
            restaurant_id,
            order_id,
            arrival_time,
        }
    }

    pub fn restaurant_id(&self) -> usize {
        self.restaurant_id
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// Time spent waiting if service starts at `now`
    pub fn wait_time(&self, now: f64) -> f64 {
        now - self.arrival_time
    }

    /// True if this is the given restaurant's order with the given id
    pub fn matches(&self, restaurant_id: usize, order_id: u64) -> bool {
        self.restaurant_id == restaurant_id && self.order_id == order_id
    }
}
