//! Python bindings (enabled with the `pyo3` feature)

pub mod simulator;
pub mod types;
