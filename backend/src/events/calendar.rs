//! Event calendar
//!
//! Pending events ordered by `(time, sequence)`. The sequence number is taken
//! from a counter at insertion, so events with equal timestamps leave the
//! calendar in the order they were scheduled (FIFO).

use crate::models::Event;
use log::trace;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An event waiting in the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Insertion order, used to break timestamp ties
    pub sequence: u64,
    pub event: Event,
}

impl ScheduledEvent {
    fn time(&self) -> f64 {
        self.event.time()
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want earliest first
        other
            .time()
            .total_cmp(&self.time())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Time-ordered priority queue of pending events
///
/// # Example
/// ```
/// use smo_simulator_core_rs::events::EventCalendar;
/// use smo_simulator_core_rs::models::Event;
///
/// let mut calendar = EventCalendar::new();
/// calendar.push(Event::OrderGenerated { time: 5.0, restaurant_id: 0, order_id: 1 });
/// calendar.push(Event::OrderGenerated { time: 0.0, restaurant_id: 1, order_id: 0 });
///
/// assert_eq!(calendar.pop_earliest().unwrap().time(), 0.0);
/// assert_eq!(calendar.pop_earliest().unwrap().time(), 5.0);
/// assert!(calendar.pop_earliest().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventCalendar {
    queue: BinaryHeap<ScheduledEvent>,
    next_sequence: u64,
}

impl EventCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a calendar from checkpointed entries
    ///
    /// `next_sequence` is raised above every restored sequence number so new
    /// insertions still sort after restored ties.
    pub fn from_entries(entries: Vec<ScheduledEvent>, next_sequence: u64) -> Self {
        let floor = entries.iter().map(|e| e.sequence + 1).max().unwrap_or(0);
        Self {
            queue: entries.into_iter().collect(),
            next_sequence: next_sequence.max(floor),
        }
    }

    /// Schedule an event
    pub fn push(&mut self, event: Event) {
        trace!("schedule {} (seq {})", event, self.next_sequence);
        self.queue.push(ScheduledEvent {
            sequence: self.next_sequence,
            event,
        });
        self.next_sequence += 1;
    }

    /// Remove and return the earliest event
    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.queue.pop().map(|scheduled| scheduled.event)
    }

    /// Time of the earliest event without removing it
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|scheduled| scheduled.time())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending entries in the order they will be processed
    ///
    /// Works on a copy; the calendar itself is untouched.
    pub fn ordered_entries(&self) -> Vec<ScheduledEvent> {
        self.queue.clone().into_sorted_vec().into_iter().rev().collect()
    }

    /// Pending events in the order they will be processed
    pub fn pending(&self) -> Vec<Event> {
        self.ordered_entries()
            .into_iter()
            .map(|scheduled| scheduled.event)
            .collect()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Drop every pending event and restart sequence numbering
    pub fn clear(&mut self) {
        self.queue.clear();
        self.next_sequence = 0;
    }
}
