//! Order buffer with positional compaction
//!
//! A fixed number of slots holding orders that arrived while every operator
//! was busy.
//!
//! # Discipline
//!
//! - **Insertion** always takes the lowest-indexed free slot.
//! - **Removal** at position `p` shifts every later slot one index to the
//!   left and clears the last slot.
//!
//! Together these keep the occupied slots as a gap-free prefix
//! `[0, size)`, ordered by arrival.
//!
//! # Critical Invariants
//!
//! 1. `0 <= size <= capacity`
//! 2. Slots `[0, size)` are occupied, slots `[size, capacity)` are empty

use crate::models::order::Order;
use thiserror::Error;

/// Structural problems found when rebuilding a buffer from raw slots
#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("Buffer capacity must be positive")]
    ZeroCapacity,

    #[error("Empty slot {empty} precedes occupied slot {occupied}")]
    Gap { empty: usize, occupied: usize },
}

/// Fixed-capacity, order-preserving buffer
///
/// # Example
/// ```
/// use smo_simulator_core_rs::Buffer;
///
/// let mut buffer = Buffer::new(2);
/// assert!(buffer.try_admit(0, 0, 1.0));
/// assert!(buffer.try_admit(1, 0, 2.0));
/// assert!(!buffer.try_admit(0, 1, 3.0)); // full
///
/// let removed = buffer.remove_at(0).unwrap();
/// assert_eq!(removed.restaurant_id(), 0);
/// assert_eq!(buffer.slots()[0].unwrap().restaurant_id(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    slots: Vec<Option<Order>>,
    size: usize,
}

impl Buffer {
    /// Create an empty buffer
    ///
    /// # Panics
    /// Panics if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self {
            slots: vec![None; capacity],
            size: 0,
        }
    }

    /// Rebuild a buffer from checkpointed slots
    pub fn from_slots(slots: Vec<Option<Order>>) -> Result<Self, BufferError> {
        if slots.is_empty() {
            return Err(BufferError::ZeroCapacity);
        }

        let size = slots.iter().take_while(|s| s.is_some()).count();
        if let Some(occupied) = slots[size..].iter().position(|s| s.is_some()) {
            return Err(BufferError::Gap {
                empty: size,
                occupied: size + occupied,
            });
        }

        Ok(Self { slots, size })
    }

    /// Place an order in the lowest free slot
    ///
    /// Returns `false` without touching the buffer when it is full.
    pub fn try_admit(&mut self, restaurant_id: usize, order_id: u64, time: f64) -> bool {
        if self.is_full() {
            return false;
        }

        // The occupied slots form a prefix, so the first free slot is `size`
        self.slots[self.size] = Some(Order::new(restaurant_id, order_id, time));
        self.size += 1;
        true
    }

    /// Remove the order at `position` and compact the slots behind it
    ///
    /// Returns `None` for an out-of-range or empty position, leaving the
    /// buffer untouched.
    pub fn remove_at(&mut self, position: usize) -> Option<Order> {
        let removed = self.slots.get_mut(position)?.take()?;

        self.slots[position..].rotate_left(1);
        self.size -= 1;

        Some(removed)
    }

    /// Slot index of a specific order
    pub fn position_of(&self, restaurant_id: usize, order_id: u64) -> Option<usize> {
        self.slots[..self.size]
            .iter()
            .position(|slot| slot.map_or(false, |o| o.matches(restaurant_id, order_id)))
    }

    /// All buffered orders of one restaurant, in slot order
    pub fn orders_of(&self, restaurant_id: usize) -> Vec<(usize, Order)> {
        self.occupied()
            .filter(|(_, order)| order.restaurant_id() == restaurant_id)
            .collect()
    }

    /// Smallest restaurant id with at least one buffered order
    pub fn lowest_restaurant(&self) -> Option<usize> {
        self.occupied().map(|(_, order)| order.restaurant_id()).min()
    }

    /// Occupied slots with their positions
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Order)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| slot.map(|order| (position, order)))
    }

    /// Raw slot contents, including empty slots
    pub fn slots(&self) -> &[Option<Order>] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.slots.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "buffer capacity must be positive")]
    fn test_zero_capacity_panics() {
        Buffer::new(0);
    }

    #[test]
    fn test_remove_from_middle_compacts() {
        let mut buffer = Buffer::new(4);
        for id in 0..4 {
            assert!(buffer.try_admit(0, id, id as f64));
        }

        let removed = buffer.remove_at(1).unwrap();
        assert_eq!(removed.order_id(), 1);

        let ids: Vec<Option<u64>> = buffer.slots().iter().map(|s| s.map(|o| o.order_id())).collect();
        assert_eq!(ids, vec![Some(0), Some(2), Some(3), None]);
        assert_eq!(buffer.size(), 3);
    }

    #[test]
    fn test_remove_empty_slot_is_noop() {
        let mut buffer = Buffer::new(3);
        buffer.try_admit(0, 0, 0.0);
        let before = buffer.clone();

        assert!(buffer.remove_at(1).is_none());
        assert!(buffer.remove_at(99).is_none());
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_from_slots_rejects_gap() {
        let slots = vec![None, Some(Order::new(0, 0, 0.0))];
        assert_eq!(
            Buffer::from_slots(slots),
            Err(BufferError::Gap {
                empty: 0,
                occupied: 1
            })
        );
    }

    #[test]
    fn test_from_slots_counts_prefix() {
        let slots = vec![Some(Order::new(1, 0, 0.0)), None, None];
        let buffer = Buffer::from_slots(slots).unwrap();
        assert_eq!(buffer.size(), 1);
        assert_eq!(buffer.capacity(), 3);
    }

    #[test]
    fn test_lowest_restaurant() {
        let mut buffer = Buffer::new(3);
        assert_eq!(buffer.lowest_restaurant(), None);
        buffer.try_admit(2, 0, 0.0);
        buffer.try_admit(1, 0, 1.0);
        buffer.try_admit(2, 1, 2.0);
        assert_eq!(buffer.lowest_restaurant(), Some(1));
    }
}
