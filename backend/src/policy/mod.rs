//! Dispatching policies
//!
//! Two decisions drive the order center:
//!
//! - **Placement** ([`PlacementDispatcher`]): where does a new order go?
//!   Idle operator, buffer, or rejection.
//! - **Selection** ([`SelectionDispatcher`]): which buffered order does a
//!   freed operator take next? Restaurant batches, lowest id first.
//!
//! Both are pure with respect to time. They look at the component state they
//! are handed and return events; the simulator decides when those events
//! take effect.

pub mod placement;
pub mod selection;

pub use placement::PlacementDispatcher;
pub use selection::SelectionDispatcher;
