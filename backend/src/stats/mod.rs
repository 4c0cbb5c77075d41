//! Run statistics
//!
//! Counters and sums collected while the simulation runs. Statistics are
//! write-only from the engine's point of view: nothing here ever feeds back
//! into a dispatching decision.
//!
//! # Conservation
//!
//! At any point of a run:
//!
//! ```text
//! total_orders == total_processed + total_rejected + buffered + in_service
//! ```
//!
//! `processed` is counted when an operator *finishes* an order, so orders in
//! service are not yet part of it.

use serde::{Deserialize, Serialize};

/// Counters for one restaurant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantStats {
    /// Orders emitted by the restaurant
    pub generated: u64,

    /// Orders whose service has finished
    pub processed: u64,

    /// Orders turned away because no operator was idle and the buffer was full
    pub rejected: u64,

    /// Sum of waiting times of processed orders
    pub total_wait_time: f64,

    /// Sum of service durations of processed orders
    pub total_process_time: f64,
}

impl RestaurantStats {
    /// Share of generated orders that were rejected
    pub fn rejection_rate(&self) -> f64 {
        if self.generated == 0 {
            return 0.0;
        }
        self.rejected as f64 / self.generated as f64
    }

    /// Mean waiting time over processed orders
    pub fn avg_wait_time(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.total_wait_time / self.processed as f64
    }

    /// Mean service duration over processed orders
    pub fn avg_process_time(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.total_process_time / self.processed as f64
    }
}

/// Per-restaurant and global counters for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    restaurants: Vec<RestaurantStats>,
    total_orders: u64,
    total_processed: u64,
    total_rejected: u64,
}

impl Statistics {
    /// Zeroed statistics for `restaurant_count` restaurants
    pub fn new(restaurant_count: usize) -> Self {
        Self {
            restaurants: vec![RestaurantStats::default(); restaurant_count],
            total_orders: 0,
            total_processed: 0,
            total_rejected: 0,
        }
    }

    pub fn order_generated(&mut self, restaurant_id: usize) {
        if let Some(stats) = self.restaurants.get_mut(restaurant_id) {
            stats.generated += 1;
        }
        self.total_orders += 1;
    }

    pub fn order_processed(&mut self, restaurant_id: usize, wait_time: f64, process_time: f64) {
        if let Some(stats) = self.restaurants.get_mut(restaurant_id) {
            stats.processed += 1;
            stats.total_wait_time += wait_time;
            stats.total_process_time += process_time;
        }
        self.total_processed += 1;
    }

    pub fn order_rejected(&mut self, restaurant_id: usize) {
        if let Some(stats) = self.restaurants.get_mut(restaurant_id) {
            stats.rejected += 1;
        }
        self.total_rejected += 1;
    }

    /// Share of all generated orders that were rejected
    pub fn rejection_rate(&self) -> f64 {
        if self.total_orders == 0 {
            return 0.0;
        }
        self.total_rejected as f64 / self.total_orders as f64
    }

    /// Mean waiting time over every processed order
    pub fn avg_wait_time(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        let total: f64 = self.restaurants.iter().map(|s| s.total_wait_time).sum();
        total / self.total_processed as f64
    }

    pub fn restaurant(&self, restaurant_id: usize) -> Option<&RestaurantStats> {
        self.restaurants.get(restaurant_id)
    }

    pub fn restaurants(&self) -> &[RestaurantStats] {
        &self.restaurants
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    /// Zero every counter, keeping the restaurant count
    pub fn reset(&mut self) {
        self.restaurants
            .iter_mut()
            .for_each(|stats| *stats = RestaurantStats::default());
        self.total_orders = 0;
        self.total_processed = 0;
        self.total_rejected = 0;
    }
}

/// Per-restaurant line of a [`StatisticsSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub restaurant_id: usize,
    pub generated: u64,
    pub processed: u64,
    pub rejected: u64,
    pub rejection_rate: f64,
    pub avg_wait_time: f64,
    pub avg_process_time: f64,
}

/// Per-operator line of a [`StatisticsSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSummary {
    pub operator_id: usize,
    pub processed_count: u64,
    pub busy_time: f64,
    pub utilization: f64,
}

/// Read-only report of a run at one point in virtual time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub current_time: f64,
    pub step_count: u64,
    pub total_orders: u64,
    pub total_processed: u64,
    pub total_rejected: u64,
    pub rejection_rate: f64,
    pub avg_wait_time: f64,
    /// Orders waiting in the buffer
    pub buffered: usize,
    /// Orders currently being served
    pub in_service: usize,
    pub restaurants: Vec<RestaurantSummary>,
    pub operators: Vec<OperatorSummary>,
}

impl StatisticsSummary {
    /// Orders accounted for by the conservation identity
    pub fn accounted_orders(&self) -> u64 {
        self.total_processed + self.total_rejected + self.buffered as u64 + self.in_service as u64
    }
}

impl RestaurantSummary {
    pub fn from_stats(restaurant_id: usize, stats: &RestaurantStats) -> Self {
        Self {
            restaurant_id,
            generated: stats.generated,
            processed: stats.processed,
            rejected: stats.rejected,
            rejection_rate: stats.rejection_rate(),
            avg_wait_time: stats.avg_wait_time(),
            avg_process_time: stats.avg_process_time(),
        }
    }
}
