//! PyO3 wrapper for Simulator
//!
//! This module provides the Python interface to the Rust simulator. It takes
//! the place of an interactive console driver: Python code steps the run and
//! reads snapshots back as plain dicts and lists.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{
    event_to_py, events_to_py, operator_to_py, parse_simulator_config, run_summary_to_py,
    source_to_py, statistics_to_py,
};
use crate::orchestrator::{SimulationError, Simulator as RustSimulator};

fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidConfig(msg) => PyValueError::new_err(msg),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Python wrapper for Rust Simulator
///
/// # Example (from Python)
///
/// ```python
/// from smo_simulator_core_rs import Simulator
///
/// sim = Simulator.new({"restaurant_count": 3, "operator_count": 2, "buffer_capacity": 5})
/// sim.initialize(100.0)
/// while sim.step():
///     if sim.current_time() >= 100.0:
///         break
/// print(sim.statistics()["rejection_rate"])
/// ```
#[pyclass(name = "Simulator")]
pub struct PySimulator {
    inner: RustSimulator,
}

#[pymethods]
impl PySimulator {
    /// Create a simulator from a config dict
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Raises ValueError if a value is out of range or has the wrong type
    #[staticmethod]
    fn new(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let rust_config = parse_simulator_config(config)?;
        let inner = RustSimulator::new(rust_config).map_err(to_py_err)?;
        Ok(PySimulator { inner })
    }

    /// Reset all state and seed the first arrivals
    fn initialize(&mut self, horizon: f64) -> PyResult<()> {
        self.inner.initialize(horizon).map_err(to_py_err)
    }

    /// Process one event; False once the calendar is empty
    fn step(&mut self) -> PyResult<bool> {
        self.inner.step().map_err(to_py_err)
    }

    /// Step until the next event lies beyond `horizon`
    ///
    /// Returns `{"steps": int, "final_time": float}`
    fn run_until(&mut self, py: Python, horizon: f64) -> PyResult<Py<PyDict>> {
        let summary = self.inner.run_until(horizon).map_err(to_py_err)?;
        run_summary_to_py(py, &summary)
    }

    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn step_count(&self) -> u64 {
        self.inner.step_count()
    }

    /// Buffer contents by slot; empty slots are None
    fn buffer_slots(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for slot in self.inner.buffer().slots() {
            match slot {
                Some(order) => {
                    let dict = PyDict::new_bound(py);
                    dict.set_item("restaurant_id", order.restaurant_id())?;
                    dict.set_item("order_id", order.order_id())?;
                    dict.set_item("arrival_time", order.arrival_time())?;
                    list.append(dict)?;
                }
                None => list.append(py.None())?,
            }
        }
        Ok(list.unbind())
    }

    fn operators(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for operator in self.inner.operators() {
            list.append(operator_to_py(py, operator)?)?;
        }
        Ok(list.unbind())
    }

    fn sources(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for source in self.inner.sources() {
            list.append(source_to_py(py, source)?)?;
        }
        Ok(list.unbind())
    }

    /// `(restaurant_id, remaining)`; restaurant_id is -1 without a batch
    fn batch_info(&self) -> (i64, usize) {
        let (restaurant, remaining) = self.inner.batch_info();
        let restaurant = restaurant.map_or(-1, |id| id as i64);
        (restaurant, remaining)
    }

    fn statistics(&self, py: Python) -> PyResult<Py<PyDict>> {
        statistics_to_py(py, &self.inner.statistics_summary())
    }

    /// Pending calendar events in processing order
    fn pending_events(&self, py: Python) -> PyResult<Py<PyList>> {
        events_to_py(py, &self.inner.pending_events())
    }

    /// Last `n` handled events as `(step, event)` pairs
    fn recent_events(&self, py: Python, n: usize) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for entry in self.inner.event_log().last(n) {
            list.append((entry.step, event_to_py(py, &entry.event)?))?;
        }
        Ok(list.unbind())
    }

    /// Serialize the state to a JSON string
    fn save_state(&self) -> PyResult<String> {
        self.inner.save_state().map_err(to_py_err)
    }

    /// Restore a simulator saved with the same config
    #[staticmethod]
    fn load_state(config: &Bound<'_, PyDict>, state_json: &str) -> PyResult<Self> {
        let rust_config = parse_simulator_config(config)?;
        let inner = RustSimulator::load_state(rust_config, state_json).map_err(to_py_err)?;
        Ok(PySimulator { inner })
    }
}
