//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList, etc.)

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::arrivals::ArrivalSource;
use crate::models::{Event, Operator};
use crate::orchestrator::{RunSummary, SimulatorConfig};
use crate::stats::StatisticsSummary;

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a field, falling back to `default` when it is missing
///
/// # Errors
/// Returns error only if type conversion fails (not if field is missing)
fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

// ========================================================================
// Configuration Parser
// ========================================================================

/// Convert Python dict to SimulatorConfig
///
/// Every key is optional; missing keys take the default configuration.
/// Range checks are left to `Simulator::new`.
pub fn parse_simulator_config(py_config: &Bound<'_, PyDict>) -> PyResult<SimulatorConfig> {
    let defaults = SimulatorConfig::default();

    Ok(SimulatorConfig {
        restaurant_count: extract_with_default(
            py_config,
            "restaurant_count",
            defaults.restaurant_count,
        )?,
        operator_count: extract_with_default(py_config, "operator_count", defaults.operator_count)?,
        buffer_capacity: extract_with_default(
            py_config,
            "buffer_capacity",
            defaults.buffer_capacity,
        )?,
        arrival_interval: extract_with_default(
            py_config,
            "arrival_interval",
            defaults.arrival_interval,
        )?,
        mean_service_time: extract_with_default(
            py_config,
            "mean_service_time",
            defaults.mean_service_time,
        )?,
        rng_seed: extract_with_default(py_config, "rng_seed", defaults.rng_seed)?,
    })
}

// ========================================================================
// Result Converters
// ========================================================================

/// Convert an Event to a flat Python dict
///
/// Fields a kind does not carry are `None`.
pub fn event_to_py(py: Python, event: &Event) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("kind", event.kind().as_str())?;
    dict.set_item("time", event.time())?;
    dict.set_item("restaurant_id", event.restaurant_id())?;
    dict.set_item("order_id", event.order_id())?;
    dict.set_item("operator_id", event.operator_id())?;
    dict.set_item("buffer_position", event.buffer_position())?;
    dict.set_item("wait_time", event.wait_time())?;
    if let Event::CoordinationStart {
        completion_time, ..
    } = event
    {
        dict.set_item("completion_time", completion_time)?;
    }
    Ok(dict.unbind())
}

/// Convert a list of events to a Python list of dicts
pub fn events_to_py(py: Python, events: &[Event]) -> PyResult<Py<PyList>> {
    let list = PyList::empty_bound(py);
    for event in events {
        list.append(event_to_py(py, event)?)?;
    }
    Ok(list.unbind())
}

pub fn source_to_py(py: Python, source: &ArrivalSource) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("restaurant_id", source.restaurant_id())?;
    dict.set_item("generated_count", source.generated_count())?;
    dict.set_item("next_generation_time", source.next_generation_time())?;
    Ok(dict.unbind())
}

pub fn operator_to_py(py: Python, operator: &Operator) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("operator_id", operator.id())?;
    dict.set_item("busy", operator.is_busy())?;
    dict.set_item(
        "restaurant_id",
        operator.assignment().map(|a| a.restaurant_id),
    )?;
    dict.set_item("order_id", operator.assignment().map(|a| a.order_id))?;
    dict.set_item("completion_time", operator.completion_time())?;
    dict.set_item("processed_count", operator.processed_count())?;
    Ok(dict.unbind())
}

pub fn run_summary_to_py(py: Python, summary: &RunSummary) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("steps", summary.steps)?;
    dict.set_item("final_time", summary.final_time)?;
    Ok(dict.unbind())
}

/// Convert StatisticsSummary to Python dict
///
/// Per-restaurant and per-operator lines become lists of dicts.
pub fn statistics_to_py(py: Python, summary: &StatisticsSummary) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("current_time", summary.current_time)?;
    dict.set_item("step_count", summary.step_count)?;
    dict.set_item("total_orders", summary.total_orders)?;
    dict.set_item("total_processed", summary.total_processed)?;
    dict.set_item("total_rejected", summary.total_rejected)?;
    dict.set_item("rejection_rate", summary.rejection_rate)?;
    dict.set_item("avg_wait_time", summary.avg_wait_time)?;
    dict.set_item("buffered", summary.buffered)?;
    dict.set_item("in_service", summary.in_service)?;

    let restaurants = PyList::empty_bound(py);
    for r in &summary.restaurants {
        let line = PyDict::new_bound(py);
        line.set_item("restaurant_id", r.restaurant_id)?;
        line.set_item("generated", r.generated)?;
        line.set_item("processed", r.processed)?;
        line.set_item("rejected", r.rejected)?;
        line.set_item("rejection_rate", r.rejection_rate)?;
        line.set_item("avg_wait_time", r.avg_wait_time)?;
        line.set_item("avg_process_time", r.avg_process_time)?;
        restaurants.append(line)?;
    }
    dict.set_item("restaurants", restaurants)?;

    let operators = PyList::empty_bound(py);
    for op in &summary.operators {
        let line = PyDict::new_bound(py);
        line.set_item("operator_id", op.operator_id)?;
        line.set_item("processed_count", op.processed_count)?;
        line.set_item("busy_time", op.busy_time)?;
        line.set_item("utilization", op.utilization)?;
        operators.append(line)?;
    }
    dict.set_item("operators", operators)?;

    Ok(dict.unbind())
}
