//! Tests for batch-aware selection
//!
//! Critical invariants tested:
//! - A new batch goes to the lowest restaurant id in the buffer
//! - A running batch drains completely before switching
//! - Same-restaurant arrivals join the running batch

use smo_simulator_core_rs::models::EventKind;
use smo_simulator_core_rs::{Buffer, SelectionDispatcher};

/// Select, then remove from the buffer the way the simulator does
fn take_next(selection: &mut SelectionDispatcher, buffer: &mut Buffer, time: f64) -> Option<(usize, u64)> {
    let event = selection.select_next(buffer, time)?;
    assert_eq!(event.kind(), EventKind::OrderSelected);

    let position = event.buffer_position().unwrap();
    let order = buffer.remove_at(position).unwrap();
    assert!(order.matches(event.restaurant_id(), event.order_id()));
    selection.buffer_compacted(position);

    Some((event.restaurant_id(), event.order_id()))
}

#[test]
fn test_empty_buffer_selects_nothing() {
    let mut selection = SelectionDispatcher::new();
    assert!(selection.select_next(&Buffer::new(3), 0.0).is_none());
    assert_eq!(selection.current_batch_info(), (None, 0));
}

#[test]
fn test_batch_drains_before_switch() {
    let mut buffer = Buffer::new(6);
    buffer.try_admit(2, 0, 0.0);
    buffer.try_admit(1, 0, 1.0);
    buffer.try_admit(2, 1, 2.0);
    buffer.try_admit(1, 1, 3.0);
    buffer.try_admit(3, 0, 4.0);

    let mut selection = SelectionDispatcher::new();
    let mut served = Vec::new();
    while let Some(next) = take_next(&mut selection, &mut buffer, 10.0) {
        served.push(next);
    }

    assert_eq!(
        served,
        vec![(1, 0), (1, 1), (2, 0), (2, 1), (3, 0)]
    );
    assert!(buffer.is_empty());
}

#[test]
fn test_lower_id_arrival_waits_for_running_batch() {
    let mut buffer = Buffer::new(5);
    buffer.try_admit(1, 0, 0.0);
    buffer.try_admit(1, 1, 1.0);

    let mut selection = SelectionDispatcher::new();
    assert_eq!(take_next(&mut selection, &mut buffer, 2.0), Some((1, 0)));

    // Restaurant 0 shows up mid-batch
    buffer.try_admit(0, 0, 3.0);
    assert_eq!(take_next(&mut selection, &mut buffer, 4.0), Some((1, 1)));
    assert_eq!(take_next(&mut selection, &mut buffer, 5.0), Some((0, 0)));
}

#[test]
fn test_same_restaurant_arrival_joins_batch() {
    let mut buffer = Buffer::new(5);
    buffer.try_admit(1, 0, 0.0);
    buffer.try_admit(0, 0, 0.5);

    let mut selection = SelectionDispatcher::new();
    assert_eq!(take_next(&mut selection, &mut buffer, 1.0), Some((0, 0)));
    assert_eq!(selection.current_batch_info(), (Some(0), 0));

    // Batch 0 is exhausted, but another order of restaurant 0 arrives first
    buffer.try_admit(0, 1, 1.5);
    selection.order_buffered(&buffer, 0);
    assert_eq!(selection.current_batch_info(), (Some(0), 1));
    assert_eq!(take_next(&mut selection, &mut buffer, 2.0), Some((0, 1)));
    assert_eq!(take_next(&mut selection, &mut buffer, 3.0), Some((1, 0)));
}

#[test]
fn test_wait_time_is_time_since_arrival() {
    let mut buffer = Buffer::new(2);
    buffer.try_admit(0, 0, 2.5);

    let mut selection = SelectionDispatcher::new();
    let event = selection.select_next(&buffer, 10.0).unwrap();
    assert_eq!(event.wait_time(), Some(7.5));
    assert_eq!(event.operator_id(), None);
}

#[test]
fn test_selection_does_not_touch_buffer() {
    let mut buffer = Buffer::new(2);
    buffer.try_admit(0, 0, 0.0);
    let before = buffer.clone();

    let mut selection = SelectionDispatcher::new();
    selection.select_next(&buffer, 1.0).unwrap();
    assert_eq!(buffer, before);
}

#[test]
fn test_reset_forgets_batch() {
    let mut buffer = Buffer::new(3);
    buffer.try_admit(4, 0, 0.0);
    buffer.try_admit(4, 1, 0.0);

    let mut selection = SelectionDispatcher::new();
    selection.select_next(&buffer, 1.0).unwrap();
    assert_eq!(selection.current_batch_info(), (Some(4), 1));

    selection.reset();
    assert_eq!(selection.current_batch_info(), (None, 0));
}
