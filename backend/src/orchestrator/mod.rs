//! Orchestrator - the event-driven simulation loop
//!
//! See `engine.rs` for the simulator and `checkpoint.rs` for save/restore.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{RunSummary, SimulationError, Simulator, SimulatorConfig};

// Re-export checkpoint types
pub use checkpoint::{CheckpointError, OperatorSnapshot, SourceSnapshot, StateSnapshot};
