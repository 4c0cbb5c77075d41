//! Domain models for the order center

pub mod buffer;
pub mod event;
pub mod operator;
pub mod order;

// Re-exports
pub use buffer::{Buffer, BufferError};
pub use event::{Event, EventKind, EventLog, LoggedEvent};
pub use operator::{Assignment, Operator, OperatorError};
pub use order::Order;
