//! Checkpoint - Save/Load Simulation State
//!
//! Serializes the complete simulator state so a run can be paused and resumed
//! in memory. Nothing is written to disk.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored simulator continues exactly like the original
//! - **Conservation**: `total_orders == processed + rejected + buffered + in_service`
//! - **Buffer Integrity**: occupied slots form a gap-free prefix
//! - **Config Matching**: state can only be loaded with the config it was saved with

use crate::arrivals::ArrivalSource;
use crate::events::ScheduledEvent;
use crate::models::{Assignment, Event, EventKind, Operator, Order};
use crate::orchestrator::engine::{SimulationError, SimulatorConfig};
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Reasons a checkpoint cannot be written or restored
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Config hash mismatch: checkpoint has {found}, config gives {expected}")]
    ConfigMismatch { expected: String, found: String },

    #[error("Malformed checkpoint: {0}")]
    Malformed(String),

    #[error("Invalid checkpoint state: {0}")]
    InvalidState(String),

    #[error("Simulators with an injected uniform source cannot be checkpointed")]
    InjectedSource,
}

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete simulator state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// SHA256 of the config the state belongs to
    pub config_hash: String,

    pub current_time: f64,
    pub step_count: u64,
    pub horizon: f64,

    /// Service-time generator state (CRITICAL for determinism)
    pub rng_state: u64,

    pub sources: Vec<SourceSnapshot>,
    pub buffer_slots: Vec<Option<Order>>,
    pub operators: Vec<OperatorSnapshot>,

    /// Active selection batch
    pub batch_restaurant: Option<usize>,
    pub batch_orders: Vec<(usize, Order)>,

    pub statistics: Statistics,

    /// Pending events with their tie-break sequence numbers
    pub calendar: Vec<ScheduledEvent>,
    pub next_sequence: u64,
}

/// Arrival source state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub restaurant_id: usize,
    pub generated_count: u64,
    pub next_generation_time: f64,
}

impl From<&ArrivalSource> for SourceSnapshot {
    fn from(source: &ArrivalSource) -> Self {
        SourceSnapshot {
            restaurant_id: source.restaurant_id(),
            generated_count: source.generated_count(),
            next_generation_time: source.next_generation_time(),
        }
    }
}

impl SourceSnapshot {
    /// The interval comes from the config, not the snapshot
    pub fn into_source(self, interval: f64) -> ArrivalSource {
        ArrivalSource::from_snapshot(
            self.restaurant_id,
            interval,
            self.generated_count,
            self.next_generation_time,
        )
    }
}

/// Operator state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    pub id: usize,
    pub assignment: Option<Assignment>,
    pub completion_time: Option<f64>,
    pub processed_count: u64,
    pub busy_time: f64,
}

impl From<&Operator> for OperatorSnapshot {
    fn from(operator: &Operator) -> Self {
        OperatorSnapshot {
            id: operator.id(),
            assignment: operator.assignment().copied(),
            completion_time: operator.completion_time(),
            processed_count: operator.processed_count(),
            busy_time: operator.busy_time(),
        }
    }
}

impl OperatorSnapshot {
    pub fn into_operator(self, mean_service_time: f64) -> Operator {
        Operator::from_snapshot(
            self.id,
            mean_service_time,
            self.assignment,
            self.completion_time,
            self.processed_count,
            self.busy_time,
        )
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Deterministic SHA256 of the config
///
/// Struct fields serialize in declaration order, so the JSON text is
/// canonical without extra sorting.
pub fn compute_config_hash(config: &SimulatorConfig) -> Result<String, SimulationError> {
    let json = serde_json::to_string(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Check a snapshot against the config it is about to be restored with
///
/// Verifies:
/// - config hash
/// - component counts and id order
/// - buffer prefix discipline
/// - operator busy/completion consistency
/// - calendar contains nothing before the clock
/// - one pending arrival per started source
/// - one pending completion per busy operator, none for idle ones
/// - conservation of orders
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    config: &SimulatorConfig,
    expected_hash: &str,
) -> Result<(), CheckpointError> {
    if snapshot.config_hash != expected_hash {
        return Err(CheckpointError::ConfigMismatch {
            expected: expected_hash.to_string(),
            found: snapshot.config_hash.clone(),
        });
    }

    if !(snapshot.current_time.is_finite() && snapshot.current_time >= 0.0) {
        return invalid(format!("bad current time {}", snapshot.current_time));
    }

    // 1. Sources
    if snapshot.sources.len() != config.restaurant_count {
        return invalid(format!(
            "{} sources for {} restaurants",
            snapshot.sources.len(),
            config.restaurant_count
        ));
    }
    if let Some((index, source)) = snapshot
        .sources
        .iter()
        .enumerate()
        .find(|(index, s)| s.restaurant_id != *index)
    {
        return invalid(format!(
            "source {} carries restaurant id {}",
            index, source.restaurant_id
        ));
    }

    // 2. Buffer
    let slots = &snapshot.buffer_slots;
    if slots.len() != config.buffer_capacity {
        return invalid(format!(
            "{} buffer slots for capacity {}",
            slots.len(),
            config.buffer_capacity
        ));
    }
    let buffered = slots.iter().take_while(|s| s.is_some()).count();
    if slots[buffered..].iter().any(Option::is_some) {
        return invalid(format!("gap in buffer after slot {}", buffered));
    }
    if let Some(order) = slots
        .iter()
        .flatten()
        .find(|o| o.restaurant_id() >= config.restaurant_count)
    {
        return invalid(format!(
            "buffered order from unknown restaurant {}",
            order.restaurant_id()
        ));
    }

    // 3. Operators
    if snapshot.operators.len() != config.operator_count {
        return invalid(format!(
            "{} operators, config has {}",
            snapshot.operators.len(),
            config.operator_count
        ));
    }
    for (index, operator) in snapshot.operators.iter().enumerate() {
        if operator.id != index {
            return invalid(format!("operator {} carries id {}", index, operator.id));
        }
        if operator.assignment.is_some() != operator.completion_time.is_some() {
            return invalid(format!(
                "operator {} has inconsistent busy state",
                operator.id
            ));
        }
    }

    // 4. Calendar
    if let Some(entry) = snapshot
        .calendar
        .iter()
        .find(|e| !e.event.time().is_finite() || e.event.time() < snapshot.current_time)
    {
        return invalid(format!(
            "pending event {} lies before t={} or is not finite",
            entry.event, snapshot.current_time
        ));
    }
    validate_pending_arrivals(snapshot)?;
    validate_pending_completions(snapshot)?;

    // 5. Conservation
    let stats = &snapshot.statistics;
    if stats.restaurants().len() != config.restaurant_count {
        return invalid("statistics restaurant count mismatch".to_string());
    }
    let in_service = snapshot
        .operators
        .iter()
        .filter(|op| op.assignment.is_some())
        .count() as u64;
    let accounted =
        stats.total_processed() + stats.total_rejected() + buffered as u64 + in_service;
    if stats.total_orders() != accounted {
        return invalid(format!(
            "conservation violated: {} orders, {} accounted for",
            stats.total_orders(),
            accounted
        ));
    }

    Ok(())
}

/// Every started source has exactly one pending arrival: the order it
/// emitted last, stamped before its next generation time
fn validate_pending_arrivals(snapshot: &StateSnapshot) -> Result<(), CheckpointError> {
    for source in &snapshot.sources {
        let pending: Vec<&Event> = snapshot
            .calendar
            .iter()
            .map(|entry| &entry.event)
            .filter(|event| {
                event.kind() == EventKind::OrderGenerated
                    && event.restaurant_id() == source.restaurant_id
            })
            .collect();

        let Some(last_id) = source.generated_count.checked_sub(1) else {
            if pending.is_empty() {
                continue;
            }
            return invalid(format!(
                "restaurant {} has pending arrivals but never generated",
                source.restaurant_id
            ));
        };

        match pending.as_slice() {
            [event] if event.order_id() == last_id
                && event.time() < source.next_generation_time => {}
            [event] => {
                return invalid(format!(
                    "pending arrival {} does not match restaurant {} (next id {}, next time {})",
                    event, source.restaurant_id, source.generated_count, source.next_generation_time
                ))
            }
            _ => {
                return invalid(format!(
                    "restaurant {} has {} pending arrivals",
                    source.restaurant_id,
                    pending.len()
                ))
            }
        }
    }

    let unknown = snapshot.calendar.iter().find(|entry| {
        entry.event.kind() == EventKind::OrderGenerated
            && entry.event.restaurant_id() >= snapshot.sources.len()
    });
    if let Some(entry) = unknown {
        return invalid(format!("pending arrival {} from unknown restaurant", entry.event));
    }
    Ok(())
}

/// Busy operators have exactly one matching pending `OperatorFree` at their
/// completion time; idle operators have none
fn validate_pending_completions(snapshot: &StateSnapshot) -> Result<(), CheckpointError> {
    let completions: Vec<&Event> = snapshot
        .calendar
        .iter()
        .map(|entry| &entry.event)
        .filter(|event| event.kind() == EventKind::OperatorFree)
        .collect();

    if let Some(event) = completions.iter().find(|event| {
        event
            .operator_id()
            .map_or(true, |id| id >= snapshot.operators.len())
    }) {
        return invalid(format!("pending completion {} for unknown operator", event));
    }

    for operator in &snapshot.operators {
        let pending: Vec<&&Event> = completions
            .iter()
            .filter(|event| event.operator_id() == Some(operator.id))
            .collect();

        match (operator.assignment, operator.completion_time) {
            (Some(assignment), Some(completion_time)) => match pending.as_slice() {
                [event] if event.restaurant_id() == assignment.restaurant_id
                    && event.order_id() == assignment.order_id
                    && event.time() == completion_time => {}
                _ => {
                    return invalid(format!(
                        "operator {} is busy until {} but its {} pending completions do not match",
                        operator.id,
                        completion_time,
                        pending.len()
                    ))
                }
            },
            _ if !pending.is_empty() => {
                return invalid(format!(
                    "idle operator {} has {} pending completions",
                    operator.id,
                    pending.len()
                ))
            }
            _ => {}
        }
    }
    Ok(())
}

fn invalid(message: String) -> Result<(), CheckpointError> {
    Err(CheckpointError::InvalidState(message))
}
