//! Simulation events and the processed-event log.
//!
//! An [`Event`] is an immutable record of something that happens at a point in
//! virtual time. Two families share the type:
//!
//! - **Calendar events** sit in the event calendar until their time comes:
//!   `OrderGenerated` and `OperatorFree`.
//! - **Immediate events** are produced while another event is being handled
//!   and take effect at the same instant: `OrderToOperator`, `OrderToBuffer`,
//!   `OrderRejected`, `OrderSelected` and `CoordinationStart`.
//!
//! Every event the simulator handles ends up in the [`EventLog`], tagged with
//! the step that produced it.
//!
//! # Example
//!
//! ```rust
//! use smo_simulator_core_rs::models::{Event, EventKind};
//!
//! let event = Event::OrderToBuffer {
//!     time: 5.0,
//!     restaurant_id: 0,
//!     order_id: 1,
//!     buffer_position: 0,
//! };
//!
//! assert_eq!(event.kind(), EventKind::OrderToBuffer);
//! assert_eq!(event.buffer_position(), Some(0));
//! assert_eq!(event.operator_id(), None);
//! ```

use serde::{Deserialize, Serialize};

/// Discriminant of [`Event`], usable as a filter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    OrderGenerated,
    OrderToBuffer,
    OrderToOperator,
    CoordinationStart,
    OperatorFree,
    OrderRejected,
    OrderSelected,
}

impl EventKind {
    /// Stable upper-case name, as shown in calendar dumps
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OrderGenerated => "ORDER_GENERATED",
            EventKind::OrderToBuffer => "ORDER_TO_BUFFER",
            EventKind::OrderToOperator => "ORDER_TO_OPERATOR",
            EventKind::CoordinationStart => "COORDINATION_START",
            EventKind::OperatorFree => "OPERATOR_FREE",
            EventKind::OrderRejected => "ORDER_REJECTED",
            EventKind::OrderSelected => "ORDER_SELECTED",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulation event.
///
/// All variants carry the virtual `time` at which they take effect and the
/// restaurant/order pair they concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// A restaurant produced a new order
    OrderGenerated {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
    },

    /// Admission placed the order in the buffer
    OrderToBuffer {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
        buffer_position: usize,
    },

    /// Admission routed the order straight to an idle operator
    OrderToOperator {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
        operator_id: usize,
    },

    /// An operator started serving an order
    CoordinationStart {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
        operator_id: usize,
        /// Sampled time at which service will finish
        completion_time: f64,
    },

    /// An operator finished serving an order and is idle again
    OperatorFree {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
        operator_id: usize,
    },

    /// No idle operator and the buffer was full
    OrderRejected {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
    },

    /// The selection policy picked a buffered order for service
    OrderSelected {
        time: f64,
        restaurant_id: usize,
        order_id: u64,
        buffer_position: usize,
        wait_time: f64,
        /// Operator that will serve the order, once known
        operator_id: Option<usize>,
    },
}

impl Event {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OrderGenerated { .. } => EventKind::OrderGenerated,
            Event::OrderToBuffer { .. } => EventKind::OrderToBuffer,
            Event::OrderToOperator { .. } => EventKind::OrderToOperator,
            Event::CoordinationStart { .. } => EventKind::CoordinationStart,
            Event::OperatorFree { .. } => EventKind::OperatorFree,
            Event::OrderRejected { .. } => EventKind::OrderRejected,
            Event::OrderSelected { .. } => EventKind::OrderSelected,
        }
    }

    /// Virtual time at which the event takes effect
    pub fn time(&self) -> f64 {
        match self {
            Event::OrderGenerated { time, .. }
            | Event::OrderToBuffer { time, .. }
            | Event::OrderToOperator { time, .. }
            | Event::CoordinationStart { time, .. }
            | Event::OperatorFree { time, .. }
            | Event::OrderRejected { time, .. }
            | Event::OrderSelected { time, .. } => *time,
        }
    }

    pub fn restaurant_id(&self) -> usize {
        match self {
            Event::OrderGenerated { restaurant_id, .. }
            | Event::OrderToBuffer { restaurant_id, .. }
            | Event::OrderToOperator { restaurant_id, .. }
            | Event::CoordinationStart { restaurant_id, .. }
            | Event::OperatorFree { restaurant_id, .. }
            | Event::OrderRejected { restaurant_id, .. }
            | Event::OrderSelected { restaurant_id, .. } => *restaurant_id,
        }
    }

    pub fn order_id(&self) -> u64 {
        match self {
            Event::OrderGenerated { order_id, .. }
            | Event::OrderToBuffer { order_id, .. }
            | Event::OrderToOperator { order_id, .. }
            | Event::CoordinationStart { order_id, .. }
            | Event::OperatorFree { order_id, .. }
            | Event::OrderRejected { order_id, .. }
            | Event::OrderSelected { order_id, .. } => *order_id,
        }
    }

    /// Operator involved, if any
    pub fn operator_id(&self) -> Option<usize> {
        match self {
            Event::OrderToOperator { operator_id, .. }
            | Event::CoordinationStart { operator_id, .. }
            | Event::OperatorFree { operator_id, .. } => Some(*operator_id),
            Event::OrderSelected { operator_id, .. } => *operator_id,
            _ => None,
        }
    }

    /// Buffer slot involved, if any
    pub fn buffer_position(&self) -> Option<usize> {
        match self {
            Event::OrderToBuffer {
                buffer_position, ..
            }
            | Event::OrderSelected {
                buffer_position, ..
            } => Some(*buffer_position),
            _ => None,
        }
    }

    /// Waiting time carried by a selection
    pub fn wait_time(&self) -> Option<f64> {
        match self {
            Event::OrderSelected { wait_time, .. } => Some(*wait_time),
            _ => None,
        }
    }

    /// Attach the serving operator to a selection; other kinds pass through
    pub fn with_operator(self, operator: usize) -> Event {
        match self {
            Event::OrderSelected {
                time,
                restaurant_id,
                order_id,
                buffer_position,
                wait_time,
                ..
            } => Event::OrderSelected {
                time,
                restaurant_id,
                order_id,
                buffer_position,
                wait_time,
                operator_id: Some(operator),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={:.3} {} restaurant={} order={}",
            self.time(),
            self.kind(),
            self.restaurant_id(),
            self.order_id()
        )?;
        if let Some(operator_id) = self.operator_id() {
            write!(f, " operator={}", operator_id)?;
        }
        if let Some(position) = self.buffer_position() {
            write!(f, " buffer_pos={}", position)?;
        }
        if let Some(wait) = self.wait_time() {
            write!(f, " wait={:.3}", wait)?;
        }
        Ok(())
    }
}

/// An event together with the step that handled it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub step: u64,
    pub event: Event,
}

/// History of handled events, in handling order.
///
/// This is a simple wrapper around `Vec<LoggedEvent>` with query helpers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record an event handled during `step`
    pub fn log(&mut self, step: u64, event: Event) {
        self.entries.push(LoggedEvent { step, event });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries
    pub fn entries(&self) -> &[LoggedEvent] {
        &self.entries
    }

    /// Events handled during one step
    pub fn events_at_step(&self, step: u64) -> Vec<&Event> {
        self.entries
            .iter()
            .filter(|e| e.step == step)
            .map(|e| &e.event)
            .collect()
    }

    /// Events of one kind
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<&Event> {
        self.entries
            .iter()
            .map(|e| &e.event)
            .filter(|e| e.kind() == kind)
            .collect()
    }

    /// Events concerning one restaurant
    pub fn events_for_restaurant(&self, restaurant_id: usize) -> Vec<&Event> {
        self.entries
            .iter()
            .map(|e| &e.event)
            .filter(|e| e.restaurant_id() == restaurant_id)
            .collect()
    }

    /// Events concerning one operator
    pub fn events_for_operator(&self, operator_id: usize) -> Vec<&Event> {
        self.entries
            .iter()
            .map(|e| &e.event)
            .filter(|e| e.operator_id() == Some(operator_id))
            .collect()
    }

    /// The most recent `n` entries, oldest first
    pub fn last(&self, n: usize) -> &[LoggedEvent] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
