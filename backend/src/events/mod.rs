//! Event scheduling
//!
//! The calendar holds every not-yet-processed event. Event types themselves
//! live in [`crate::models::event`].

pub mod calendar;

pub use calendar::{EventCalendar, ScheduledEvent};
