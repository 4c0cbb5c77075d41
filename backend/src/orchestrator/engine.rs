//! Simulator Engine
//!
//! Event-driven main loop tying every component together:
//! - Arrival sources (periodic order generation)
//! - Placement (admission control)
//! - Selection (batch-aware resumption)
//! - Operators (exponential service)
//! - Statistics and the processed-event log
//!
//! # Architecture
//!
//! Virtual time only moves when an event is popped from the calendar:
//!
//! ```text
//! step():
//! 1. Pop the earliest event (ties: insertion order)
//! 2. Advance the clock to its timestamp
//! 3. Dispatch it by kind
//! 4. Dispatch follow-ups stamped with the same time right away
//! 5. Push future events (next arrival, service completion) to the calendar
//! ```
//!
//! Follow-ups produced at the current instant (`ORDER_TO_OPERATOR`,
//! `ORDER_TO_BUFFER`, `ORDER_REJECTED`, `ORDER_SELECTED`, `COORDINATION_START`)
//! never go through the calendar. An operator picked by admission is busy
//! before the next arrival at the same timestamp is considered.
//!
//! # Transition table
//!
//! | Event kind          | Effect                                                   |
//! |---------------------|----------------------------------------------------------|
//! | `ORDER_GENERATED`   | count it, run admission, schedule the source's next order |
//! | `ORDER_TO_OPERATOR` | start service, schedule `OPERATOR_FREE`                  |
//! | `ORDER_TO_BUFFER`   | the order waits; the active batch absorbs it             |
//! | `ORDER_SELECTED`    | take the order out of the buffer, start service          |
//! | `OPERATOR_FREE`     | finish service, record it, ask selection for more work   |
//! | `ORDER_REJECTED`    | nothing, already counted by admission                    |
//!
//! # Critical Invariants
//!
//! 1. The clock never moves backwards
//! 2. `0 <= buffer.size() <= buffer.capacity()`
//! 3. An operator serves at most one order
//! 4. `total_orders == processed + rejected + buffered + in_service`
//!
//! # Example
//!
//! ```
//! use smo_simulator_core_rs::{Simulator, SimulatorConfig};
//!
//! let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
//! sim.initialize(50.0).unwrap();
//!
//! let summary = sim.run_until(50.0).unwrap();
//! assert!(summary.steps > 0);
//! assert!(sim.current_time() <= 50.0);
//!
//! let stats = sim.statistics_summary();
//! assert_eq!(stats.total_orders, stats.accounted_orders());
//! ```

use crate::arrivals::ArrivalSource;
use crate::core::time::SimClock;
use crate::events::EventCalendar;
use crate::models::{Buffer, Event, EventKind, EventLog, Operator, OperatorError};
use crate::orchestrator::checkpoint::{
    compute_config_hash, validate_snapshot, CheckpointError, OperatorSnapshot, SourceSnapshot,
    StateSnapshot,
};
use crate::policy::{PlacementDispatcher, SelectionDispatcher};
use crate::rng::{RngManager, UniformSource};
use crate::stats::{OperatorSummary, RestaurantSummary, Statistics, StatisticsSummary};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Startup parameters of one simulation instance
///
/// Immutable once the simulator is built. Missing fields fall back to the
/// defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of restaurants (arrival sources)
    pub restaurant_count: usize,

    /// Number of operators (servers)
    pub operator_count: usize,

    /// Buffer slots for waiting orders
    pub buffer_capacity: usize,

    /// Fixed gap between two orders of the same restaurant
    pub arrival_interval: f64,

    /// Mean of the exponential service time
    pub mean_service_time: f64,

    /// Seed for service-time sampling
    pub rng_seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            restaurant_count: 3,
            operator_count: 2,
            buffer_capacity: 5,
            arrival_interval: 5.0,
            mean_service_time: 3.0,
            rng_seed: 12345,
        }
    }
}

impl SimulatorConfig {
    /// Check every parameter, reporting the first bad one
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.restaurant_count == 0 {
            return Err(SimulationError::InvalidConfig(
                "restaurant_count must be positive".to_string(),
            ));
        }
        if self.operator_count == 0 {
            return Err(SimulationError::InvalidConfig(
                "operator_count must be positive".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(SimulationError::InvalidConfig(
                "buffer_capacity must be positive".to_string(),
            ));
        }
        if !(self.arrival_interval.is_finite() && self.arrival_interval > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "arrival_interval must be positive and finite, got {}",
                self.arrival_interval
            )));
        }
        if !(self.mean_service_time.is_finite() && self.mean_service_time > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "mean_service_time must be positive and finite, got {}",
                self.mean_service_time
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Errors and Results
// ============================================================================

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The engine's own bookkeeping is inconsistent; the run cannot continue
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl From<OperatorError> for SimulationError {
    fn from(err: OperatorError) -> Self {
        SimulationError::InvariantViolation(err.to_string())
    }
}

/// Outcome of [`Simulator::run_until`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Calendar events processed by this call
    pub steps: u64,
    /// Clock after the last processed event
    pub final_time: f64,
}

// ============================================================================
// Service-time randomness
// ============================================================================

/// Where operators draw their uniforms from
enum ServiceRng {
    /// Seeded generator; reseeded on `initialize` and checkpointable
    Seeded(RngManager),
    /// Caller-supplied source, used as is
    Injected(Box<dyn UniformSource + Send>),
}

impl ServiceRng {
    fn source(&mut self) -> &mut dyn UniformSource {
        match self {
            ServiceRng::Seeded(rng) => rng,
            ServiceRng::Injected(source) => source.as_mut(),
        }
    }
}

impl std::fmt::Debug for ServiceRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceRng::Seeded(rng) => f.debug_tuple("Seeded").field(rng).finish(),
            ServiceRng::Injected(_) => f.write_str("Injected"),
        }
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Discrete-event simulator of the order center
///
/// Sole owner of the calendar and of every component. Dispatchers receive
/// borrowed views of the buffer, operators and statistics for the duration
/// of a single call.
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    clock: SimClock,
    rng: ServiceRng,
    sources: Vec<ArrivalSource>,
    operators: Vec<Operator>,
    buffer: Buffer,
    placement: PlacementDispatcher,
    selection: SelectionDispatcher,
    statistics: Statistics,
    calendar: EventCalendar,
    event_log: EventLog,

    /// Horizon given to the last `initialize`
    horizon: f64,
}

impl Simulator {
    /// Build a simulator with a seeded service-time generator
    ///
    /// The calendar starts empty; call [`Simulator::initialize`] before
    /// stepping.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulationError> {
        let rng = ServiceRng::Seeded(RngManager::new(config.rng_seed));
        Self::build(config, rng)
    }

    /// Build a simulator whose operators draw uniforms from `source`
    ///
    /// `initialize` leaves an injected source untouched, and such a
    /// simulator cannot be checkpointed.
    pub fn with_uniform_source(
        config: SimulatorConfig,
        source: Box<dyn UniformSource + Send>,
    ) -> Result<Self, SimulationError> {
        Self::build(config, ServiceRng::Injected(source))
    }

    fn build(config: SimulatorConfig, rng: ServiceRng) -> Result<Self, SimulationError> {
        config.validate()?;

        let sources = ArrivalSource::for_restaurants(config.restaurant_count, config.arrival_interval);
        let operators = (0..config.operator_count)
            .map(|id| Operator::new(id, config.mean_service_time))
            .collect();

        Ok(Self {
            clock: SimClock::new(),
            rng,
            sources,
            operators,
            buffer: Buffer::new(config.buffer_capacity),
            placement: PlacementDispatcher::new(),
            selection: SelectionDispatcher::new(),
            statistics: Statistics::new(config.restaurant_count),
            calendar: EventCalendar::new(),
            event_log: EventLog::new(),
            horizon: 0.0,
            config,
        })
    }

    /// Reset every component and seed one arrival per restaurant
    ///
    /// A seeded generator restarts from `rng_seed`, so two initializations
    /// with the same horizon replay the same run.
    pub fn initialize(&mut self, horizon: f64) -> Result<(), SimulationError> {
        check_horizon(horizon)?;

        if let ServiceRng::Seeded(rng) = &mut self.rng {
            *rng = RngManager::new(self.config.rng_seed);
        }
        self.clock.reset();
        self.sources.iter_mut().for_each(ArrivalSource::reset);
        self.operators.iter_mut().for_each(Operator::reset);
        self.buffer.clear();
        self.selection.reset();
        self.statistics.reset();
        self.calendar.clear();
        self.event_log.clear();
        self.horizon = horizon;

        for source in &mut self.sources {
            self.calendar.push(source.generate_next());
        }

        info!(
            "initialized: {} restaurants, {} operators, buffer {}, horizon {}",
            self.config.restaurant_count,
            self.config.operator_count,
            self.config.buffer_capacity,
            horizon
        );
        Ok(())
    }

    /// Process exactly one calendar event
    ///
    /// Returns `Ok(false)` when the calendar is empty. Follow-ups at the
    /// same instant are handled within this step.
    ///
    /// # Panics
    /// Panics if the popped event lies before the current time.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        let Some(event) = self.calendar.pop_earliest() else {
            return Ok(false);
        };

        self.clock.advance_to(event.time());
        let step = self.clock.step_count();

        let mut next = Some(event);
        while let Some(event) = next {
            debug!("step {}: {}", step, event);
            next = self.handle(&event).map_err(|e| {
                warn!("step {} aborted on {}: {}", step, event, e);
                e
            })?;
            self.event_log.log(step, event);
        }

        Ok(true)
    }

    /// Step while the next event is due no later than `horizon`
    ///
    /// Arrivals are periodic, so the calendar never drains on its own and
    /// the horizon must be finite.
    pub fn run_until(&mut self, horizon: f64) -> Result<RunSummary, SimulationError> {
        check_horizon(horizon)?;

        let start = self.clock.step_count();
        while self.calendar.peek_time().is_some_and(|t| t <= horizon) {
            self.step()?;
        }

        let summary = RunSummary {
            steps: self.clock.step_count() - start,
            final_time: self.clock.current_time(),
        };
        info!(
            "run to {} finished: {} steps, t={:.3}, {} orders, {} rejected",
            horizon,
            summary.steps,
            summary.final_time,
            self.statistics.total_orders(),
            self.statistics.total_rejected()
        );
        Ok(summary)
    }

    /// Put an event on the calendar
    ///
    /// Dispatch follows the transition table once it is popped. Events
    /// before the current time or without a finite time are refused, and so
    /// are arrivals: each source keeps exactly one pending `ORDER_GENERATED`.
    pub fn schedule(&mut self, event: Event) -> Result<(), SimulationError> {
        if !event.time().is_finite() {
            return Err(SimulationError::InvariantViolation(format!(
                "cannot schedule {} at a non-finite time",
                event
            )));
        }
        if event.kind() == EventKind::OrderGenerated {
            return Err(SimulationError::InvariantViolation(format!(
                "cannot schedule {}: arrivals come from the restaurant's source",
                event
            )));
        }
        if event.time() < self.clock.current_time() {
            return Err(SimulationError::InvariantViolation(format!(
                "cannot schedule {} before current time {}",
                event,
                self.clock.current_time()
            )));
        }
        self.calendar.push(event);
        Ok(())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Apply one event, returning the follow-up due at the same instant
    fn handle(&mut self, event: &Event) -> Result<Option<Event>, SimulationError> {
        match *event {
            Event::OrderGenerated {
                time,
                restaurant_id,
                order_id,
            } => {
                let source = self.sources.get_mut(restaurant_id).ok_or_else(|| {
                    SimulationError::InvariantViolation(format!(
                        "order from unknown restaurant {}",
                        restaurant_id
                    ))
                })?;
                self.calendar.push(source.generate_next());

                self.statistics.order_generated(restaurant_id);
                let placed = self.placement.admit(
                    &self.operators,
                    &mut self.buffer,
                    &mut self.statistics,
                    time,
                    restaurant_id,
                    order_id,
                );
                Ok(Some(placed))
            }

            Event::OrderToOperator {
                time,
                restaurant_id,
                order_id,
                operator_id,
            } => {
                self.ensure_idle(operator_id)?;
                self.start_service(operator_id, restaurant_id, order_id, time, 0.0)
                    .map(Some)
            }

            Event::OrderSelected {
                time,
                restaurant_id,
                order_id,
                buffer_position,
                wait_time,
                operator_id,
            } => {
                let in_slot = self
                    .buffer
                    .slots()
                    .get(buffer_position)
                    .copied()
                    .flatten();
                if !in_slot.is_some_and(|order| order.matches(restaurant_id, order_id)) {
                    return Err(SimulationError::InvariantViolation(format!(
                        "order {}/{} is not at buffer slot {}",
                        restaurant_id, order_id, buffer_position
                    )));
                }

                let operator_id = match operator_id {
                    Some(id) => id,
                    None => self
                        .placement
                        .find_free_operator(&self.operators)
                        .map(Operator::id)
                        .ok_or_else(|| {
                            SimulationError::InvariantViolation(format!(
                                "no idle operator for selected order {}/{}",
                                restaurant_id, order_id
                            ))
                        })?,
                };
                self.ensure_idle(operator_id)?;

                self.buffer.remove_at(buffer_position);
                self.selection.buffer_compacted(buffer_position);
                self.start_service(operator_id, restaurant_id, order_id, time, wait_time)
                    .map(Some)
            }

            Event::OperatorFree {
                time,
                restaurant_id,
                order_id,
                operator_id,
            } => {
                let operator = self.operator_mut(operator_id)?;
                let serving = operator
                    .assignment()
                    .is_some_and(|a| a.restaurant_id == restaurant_id && a.order_id == order_id);
                if !serving {
                    return Err(SimulationError::InvariantViolation(format!(
                        "operator {} is not serving order {}/{}",
                        operator_id, restaurant_id, order_id
                    )));
                }

                let (_, finished) = operator.complete(time)?;
                self.statistics.order_processed(
                    finished.restaurant_id,
                    finished.wait_time,
                    time - finished.started_at,
                );

                Ok(self
                    .selection
                    .select_next(&self.buffer, time)
                    .map(|selected| selected.with_operator(operator_id)))
            }

            Event::OrderToBuffer { restaurant_id, .. } => {
                self.selection.order_buffered(&self.buffer, restaurant_id);
                Ok(None)
            }

            Event::OrderRejected { .. } | Event::CoordinationStart { .. } => Ok(None),
        }
    }

    /// Assign an order and schedule its completion
    fn start_service(
        &mut self,
        operator_id: usize,
        restaurant_id: usize,
        order_id: u64,
        time: f64,
        wait_time: f64,
    ) -> Result<Event, SimulationError> {
        let operator = self
            .operators
            .get_mut(operator_id)
            .ok_or_else(|| unknown_operator(operator_id))?;
        let started = operator.assign(restaurant_id, order_id, time, wait_time, self.rng.source())?;

        if let Some(completion_time) = operator.completion_time() {
            self.calendar.push(Event::OperatorFree {
                time: completion_time,
                restaurant_id,
                order_id,
                operator_id,
            });
        }
        Ok(started)
    }

    fn ensure_idle(&self, operator_id: usize) -> Result<(), SimulationError> {
        let operator = self
            .operators
            .get(operator_id)
            .ok_or_else(|| unknown_operator(operator_id))?;
        match operator.assignment() {
            Some(current) => Err(OperatorError::AlreadyBusy {
                operator_id,
                restaurant_id: current.restaurant_id,
                order_id: current.order_id,
            }
            .into()),
            None => Ok(()),
        }
    }

    fn operator_mut(&mut self, operator_id: usize) -> Result<&mut Operator, SimulationError> {
        self.operators
            .get_mut(operator_id)
            .ok_or_else(|| unknown_operator(operator_id))
    }

    // ========================================================================
    // Read-only views
    // ========================================================================

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn step_count(&self) -> u64 {
        self.clock.step_count()
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Timestamp of the earliest pending event
    pub fn next_event_time(&self) -> Option<f64> {
        self.calendar.peek_time()
    }

    pub fn pending_event_count(&self) -> usize {
        self.calendar.len()
    }

    /// Pending events in processing order; the calendar is not touched
    pub fn pending_events(&self) -> Vec<Event> {
        self.calendar.pending()
    }

    /// Per-restaurant generation state
    pub fn sources(&self) -> &[ArrivalSource] {
        &self.sources
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Active batch restaurant and how many of its orders are still queued
    pub fn batch_info(&self) -> (Option<usize>, usize) {
        self.selection.current_batch_info()
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Every event handled so far, in handling order
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Snapshot of counters, derived rates and operator utilization
    pub fn statistics_summary(&self) -> StatisticsSummary {
        let now = self.clock.current_time();
        StatisticsSummary {
            current_time: now,
            step_count: self.clock.step_count(),
            total_orders: self.statistics.total_orders(),
            total_processed: self.statistics.total_processed(),
            total_rejected: self.statistics.total_rejected(),
            rejection_rate: self.statistics.rejection_rate(),
            avg_wait_time: self.statistics.avg_wait_time(),
            buffered: self.buffer.size(),
            in_service: self.operators.iter().filter(|op| op.is_busy()).count(),
            restaurants: self
                .statistics
                .restaurants()
                .iter()
                .enumerate()
                .map(|(id, stats)| RestaurantSummary::from_stats(id, stats))
                .collect(),
            operators: self
                .operators
                .iter()
                .map(|op| OperatorSummary {
                    operator_id: op.id(),
                    processed_count: op.processed_count(),
                    busy_time: op.busy_time(),
                    utilization: op.utilization(now),
                })
                .collect(),
        }
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Serialize the full simulation state to JSON
    ///
    /// The event log is history, not state, and is not included.
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let rng_state = match &self.rng {
            ServiceRng::Seeded(rng) => rng.state(),
            ServiceRng::Injected(_) => return Err(CheckpointError::InjectedSource.into()),
        };

        let snapshot = StateSnapshot {
            config_hash: compute_config_hash(&self.config)?,
            current_time: self.clock.current_time(),
            step_count: self.clock.step_count(),
            horizon: self.horizon,
            rng_state,
            sources: self.sources.iter().map(SourceSnapshot::from).collect(),
            buffer_slots: self.buffer.slots().to_vec(),
            operators: self.operators.iter().map(OperatorSnapshot::from).collect(),
            batch_restaurant: self.selection.current_restaurant(),
            batch_orders: self.selection.package().to_vec(),
            statistics: self.statistics.clone(),
            calendar: self.calendar.ordered_entries(),
            next_sequence: self.calendar.next_sequence(),
        };

        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Failed to serialize state: {}", e))
        })
    }

    /// Rebuild a simulator from [`Simulator::save_state`] output
    ///
    /// `config` must be the configuration the state was saved with.
    pub fn load_state(config: SimulatorConfig, json: &str) -> Result<Self, SimulationError> {
        config.validate()?;

        let snapshot: StateSnapshot = serde_json::from_str(json)
            .map_err(|e| CheckpointError::Malformed(e.to_string()))?;

        let expected_hash = compute_config_hash(&config)?;
        validate_snapshot(&snapshot, &config, &expected_hash).map_err(|e| {
            warn!("checkpoint rejected: {}", e);
            e
        })?;

        let buffer = Buffer::from_slots(snapshot.buffer_slots)
            .map_err(|e| CheckpointError::InvalidState(e.to_string()))?;
        let sources = snapshot
            .sources
            .into_iter()
            .map(|s| s.into_source(config.arrival_interval))
            .collect();
        let operators = snapshot
            .operators
            .into_iter()
            .map(|op| op.into_operator(config.mean_service_time))
            .collect();

        info!(
            "restored checkpoint at t={:.3}, step {}",
            snapshot.current_time, snapshot.step_count
        );

        Ok(Self {
            clock: SimClock::from_parts(snapshot.current_time, snapshot.step_count),
            rng: ServiceRng::Seeded(RngManager::from_state(snapshot.rng_state)),
            sources,
            operators,
            buffer,
            placement: PlacementDispatcher::new(),
            selection: SelectionDispatcher::from_snapshot(
                snapshot.batch_restaurant,
                snapshot.batch_orders,
            ),
            statistics: snapshot.statistics,
            calendar: EventCalendar::from_entries(snapshot.calendar, snapshot.next_sequence),
            event_log: EventLog::new(),
            horizon: snapshot.horizon,
            config,
        })
    }
}

fn check_horizon(horizon: f64) -> Result<(), SimulationError> {
    if horizon.is_finite() && horizon >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidConfig(format!(
            "horizon must be finite and non-negative, got {}",
            horizon
        )))
    }
}

fn unknown_operator(operator_id: usize) -> SimulationError {
    SimulationError::InvariantViolation(format!("unknown operator {}", operator_id))
}
