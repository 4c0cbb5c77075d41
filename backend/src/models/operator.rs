//! Operator model
//!
//! An operator is a single server. It handles one order at a time, and each
//! service takes an exponentially distributed amount of virtual time.
//!
//! # Critical Invariants
//!
//! - An operator holds at most one assignment (mutual exclusion)
//! - `completion_time` is set exactly while the operator is busy

use crate::models::event::Event;
use crate::rng::UniformSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when the dispatcher breaks the operator contract
#[derive(Debug, Error, PartialEq)]
pub enum OperatorError {
    #[error("Operator {operator_id} is busy, cannot take order {order_id} of restaurant {restaurant_id}")]
    AlreadyBusy {
        operator_id: usize,
        restaurant_id: usize,
        order_id: u64,
    },

    #[error("Operator {operator_id} is idle, nothing to complete")]
    NotBusy { operator_id: usize },
}

/// The order an operator is currently serving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub restaurant_id: usize,
    pub order_id: u64,
    /// Virtual time at which service started
    pub started_at: f64,
    /// Time the order waited before service started
    pub wait_time: f64,
}

/// A single server with exponential service times
///
/// # Example
/// ```
/// use smo_simulator_core_rs::{Operator, RngManager};
///
/// let mut rng = RngManager::new(1);
/// let mut operator = Operator::new(0, 3.0);
///
/// operator.assign(0, 0, 10.0, 0.0, &mut rng).unwrap();
/// assert!(operator.is_busy());
/// assert!(operator.completion_time().unwrap() >= 10.0);
///
/// // A second assignment while busy is refused
/// assert!(operator.assign(1, 0, 10.0, 0.0, &mut rng).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    id: usize,
    mean_service_time: f64,
    assignment: Option<Assignment>,
    completion_time: Option<f64>,
    /// Orders ever assigned to this operator
    processed_count: u64,
    /// Accumulated time spent on completed services
    busy_time: f64,
}

impl Operator {
    /// Create an idle operator
    ///
    /// # Panics
    /// Panics if `mean_service_time` is not a positive finite number
    pub fn new(id: usize, mean_service_time: f64) -> Self {
        assert!(
            mean_service_time.is_finite() && mean_service_time > 0.0,
            "mean_service_time must be positive"
        );
        Self {
            id,
            mean_service_time,
            assignment: None,
            completion_time: None,
            processed_count: 0,
            busy_time: 0.0,
        }
    }

    /// Rebuild an operator from checkpointed fields
    pub fn from_snapshot(
        id: usize,
        mean_service_time: f64,
        assignment: Option<Assignment>,
        completion_time: Option<f64>,
        processed_count: u64,
        busy_time: f64,
    ) -> Self {
        Self {
            id,
            mean_service_time,
            assignment,
            completion_time,
            processed_count,
            busy_time,
        }
    }

    /// Start serving an order
    ///
    /// Samples the service duration from `rng`, marks the operator busy and
    /// returns the `CoordinationStart` event. The caller schedules the
    /// matching `OperatorFree` at [`Operator::completion_time`].
    ///
    /// # Errors
    /// [`OperatorError::AlreadyBusy`] if an order is already being served.
    pub fn assign<R: UniformSource + ?Sized>(
        &mut self,
        restaurant_id: usize,
        order_id: u64,
        now: f64,
        wait_time: f64,
        rng: &mut R,
    ) -> Result<Event, OperatorError> {
        if self.is_busy() {
            return Err(OperatorError::AlreadyBusy {
                operator_id: self.id,
                restaurant_id,
                order_id,
            });
        }

        let duration = rng.exponential(self.mean_service_time);
        let completion_time = now + duration;

        self.assignment = Some(Assignment {
            restaurant_id,
            order_id,
            started_at: now,
            wait_time,
        });
        self.completion_time = Some(completion_time);
        self.processed_count += 1;

        Ok(Event::CoordinationStart {
            time: now,
            restaurant_id,
            order_id,
            operator_id: self.id,
            completion_time,
        })
    }

    /// Finish the current service
    ///
    /// Returns the `OperatorFree` event together with the finished
    /// assignment, whose `started_at` gives the actual service duration.
    ///
    /// # Errors
    /// [`OperatorError::NotBusy`] if the operator is idle.
    pub fn complete(&mut self, now: f64) -> Result<(Event, Assignment), OperatorError> {
        let assignment = self
            .assignment
            .take()
            .ok_or(OperatorError::NotBusy {
                operator_id: self.id,
            })?;

        self.completion_time = None;
        self.busy_time += now - assignment.started_at;

        let event = Event::OperatorFree {
            time: now,
            restaurant_id: assignment.restaurant_id,
            order_id: assignment.order_id,
            operator_id: self.id,
        };

        Ok((event, assignment))
    }

    /// Return to the idle, never-used state
    pub fn reset(&mut self) {
        self.assignment = None;
        self.completion_time = None;
        self.processed_count = 0;
        self.busy_time = 0.0;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.assignment.is_some()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    /// Scheduled end of the current service
    pub fn completion_time(&self) -> Option<f64> {
        self.completion_time
    }

    pub fn processed_count(&self) -> u64 {
        self.processed_count
    }

    pub fn mean_service_time(&self) -> f64 {
        self.mean_service_time
    }

    /// Time spent on completed services
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Share of `[0, now]` spent serving, counting the service in progress
    pub fn utilization(&self, now: f64) -> f64 {
        if now <= 0.0 {
            return 0.0;
        }
        let in_progress = self
            .assignment
            .map_or(0.0, |a| (now - a.started_at).max(0.0));
        ((self.busy_time + in_progress) / now).min(1.0)
    }
}
