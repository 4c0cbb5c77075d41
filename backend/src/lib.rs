//! Order Center Simulator Core - Rust Engine
//!
//! Discrete-event simulator of a food-delivery order center: restaurants
//! emit orders, operators serve them, a bounded buffer holds the overflow.
//!
//! # Architecture
//!
//! - **core**: Virtual clock
//! - **models**: Domain types (Order, Buffer, Operator, Event)
//! - **arrivals**: Periodic per-restaurant order generation
//! - **policy**: Placement (admission) and selection (batch resumption)
//! - **events**: Time-ordered event calendar
//! - **stats**: Counters and derived rates
//! - **orchestrator**: Main simulation loop and checkpointing
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Virtual time never decreases
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Equal-time events run in scheduling order
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod arrivals;
pub mod core;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod rng;
pub mod stats;

// Re-exports for convenience
pub use arrivals::ArrivalSource;
pub use core::time::SimClock;
pub use events::EventCalendar;
pub use models::{
    buffer::{Buffer, BufferError},
    event::{Event, EventKind, EventLog},
    operator::{Operator, OperatorError},
    order::Order,
};
pub use orchestrator::{
    CheckpointError, RunSummary, SimulationError, Simulator, SimulatorConfig,
};
pub use policy::{PlacementDispatcher, SelectionDispatcher};
pub use rng::{RngManager, UniformSource};
pub use stats::{Statistics, StatisticsSummary};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn smo_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulator::PySimulator>()?;
    Ok(())
}
