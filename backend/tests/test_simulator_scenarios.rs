//! End-to-end simulator scenarios
//!
//! Service durations are pinned with `ScriptedUniforms`, so every timestamp
//! below is known in advance.

use smo_simulator_core_rs::models::{Event, EventKind};
use smo_simulator_core_rs::rng::ScriptedUniforms;
use smo_simulator_core_rs::{Simulator, SimulatorConfig};

const EPS: f64 = 1e-9;

fn scripted(config: SimulatorConfig, durations: &[f64]) -> Simulator {
    let source = ScriptedUniforms::for_durations(durations, config.mean_service_time);
    Simulator::with_uniform_source(config, Box::new(source)).unwrap()
}

fn kinds(events: &[&Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind()).collect()
}

fn assert_conserved(sim: &Simulator) {
    let summary = sim.statistics_summary();
    assert_eq!(
        summary.total_orders,
        summary.accounted_orders(),
        "conservation broken at t={}",
        sim.current_time()
    );
}

// ============================================================================
// Single lane: 1 restaurant, 1 operator, buffer of 2, interval 5
// ============================================================================

fn single_lane() -> Simulator {
    let config = SimulatorConfig {
        restaurant_count: 1,
        operator_count: 1,
        buffer_capacity: 2,
        arrival_interval: 5.0,
        mean_service_time: 3.0,
        rng_seed: 1,
    };
    // First service runs past three arrivals, the next one is short
    let mut sim = scripted(config, &[17.0, 4.0]);
    sim.initialize(40.0).unwrap();
    sim
}

#[test]
fn test_single_lane_fill_and_reject() {
    let mut sim = single_lane();

    // t=0: straight to the idle operator
    sim.step().unwrap();
    assert_eq!(
        kinds(&sim.event_log().events_at_step(1)),
        vec![
            EventKind::OrderGenerated,
            EventKind::OrderToOperator,
            EventKind::CoordinationStart
        ]
    );
    assert!(sim.operators()[0].is_busy());

    // t=5: buffered at slot 0
    sim.step().unwrap();
    let step2 = sim.event_log().events_at_step(2);
    assert_eq!(step2[1].kind(), EventKind::OrderToBuffer);
    assert_eq!(step2[1].buffer_position(), Some(0));

    // t=10: buffered at slot 1
    sim.step().unwrap();
    let step3 = sim.event_log().events_at_step(3);
    assert_eq!(step3[1].buffer_position(), Some(1));
    assert!(sim.buffer().is_full());

    // t=15: buffer full, operator busy
    sim.step().unwrap();
    let step4 = sim.event_log().events_at_step(4);
    assert_eq!(step4[1].kind(), EventKind::OrderRejected);
    assert_eq!(sim.statistics().total_rejected(), 1);
    assert_eq!(sim.current_time(), 15.0);

    assert_conserved(&sim);
}

#[test]
fn test_single_lane_completion_resumes_from_buffer() {
    let mut sim = single_lane();
    for _ in 0..4 {
        sim.step().unwrap();
    }

    // t=17: operator frees up and takes the order from slot 0
    sim.step().unwrap();
    assert!((sim.current_time() - 17.0).abs() < EPS);

    let step5 = sim.event_log().events_at_step(5);
    assert_eq!(
        kinds(&step5),
        vec![
            EventKind::OperatorFree,
            EventKind::OrderSelected,
            EventKind::CoordinationStart
        ]
    );
    let selected = step5[1];
    assert_eq!(selected.order_id(), 1);
    assert_eq!(selected.buffer_position(), Some(0));
    assert_eq!(selected.operator_id(), Some(0));
    assert!((selected.wait_time().unwrap() - 12.0).abs() < EPS);

    // Order 2 moved from slot 1 to slot 0
    assert_eq!(sim.buffer().size(), 1);
    assert_eq!(sim.buffer().slots()[0].unwrap().order_id(), 2);
    assert!(sim.buffer().slots()[1].is_none());

    // First service counted on completion
    let r0 = sim.statistics().restaurant(0).unwrap();
    assert_eq!(r0.processed, 1);
    assert!((r0.total_process_time - 17.0).abs() < EPS);
    assert_eq!(r0.total_wait_time, 0.0);

    assert_conserved(&sim);
}

#[test]
fn test_single_lane_later_arrivals_queue_behind() {
    let mut sim = single_lane();
    sim.run_until(21.5).unwrap();

    // t=20: order 4 buffered behind order 2, t=21: order 2 selected
    let buffered: Vec<u64> = sim
        .event_log()
        .events_of_kind(EventKind::OrderToBuffer)
        .iter()
        .map(|e| e.order_id())
        .collect();
    assert_eq!(buffered, vec![1, 2, 4]);

    let selected: Vec<(u64, f64)> = sim
        .event_log()
        .events_of_kind(EventKind::OrderSelected)
        .iter()
        .map(|e| (e.order_id(), e.wait_time().unwrap()))
        .collect();
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[1].0, 2);
    assert!((selected[1].1 - 11.0).abs() < EPS);

    assert_eq!(sim.buffer().slots()[0].unwrap().order_id(), 4);
    assert!((sim.current_time() - 21.0).abs() < EPS);
    assert_conserved(&sim);
}

// ============================================================================
// Two restaurants sharing one operator: batching
// ============================================================================

fn two_restaurants() -> Simulator {
    let config = SimulatorConfig {
        restaurant_count: 2,
        operator_count: 1,
        buffer_capacity: 4,
        arrival_interval: 5.0,
        mean_service_time: 3.0,
        rng_seed: 1,
    };
    let mut sim = scripted(config, &[12.0, 1.0, 1.0, 3.0]);
    sim.initialize(30.0).unwrap();
    sim
}

fn served_sequence(sim: &Simulator) -> Vec<(usize, u64)> {
    sim.event_log()
        .events_of_kind(EventKind::OrderSelected)
        .iter()
        .map(|e| (e.restaurant_id(), e.order_id()))
        .collect()
}

#[test]
fn test_equal_time_arrivals_processed_in_schedule_order() {
    let mut sim = two_restaurants();
    sim.run_until(0.0).unwrap();

    // Restaurant 0 was scheduled first and takes the operator
    assert_eq!(sim.step_count(), 2);
    assert_eq!(sim.operators()[0].assignment().unwrap().restaurant_id, 0);
    assert_eq!(sim.buffer().slots()[0].unwrap().restaurant_id(), 1);
}

#[test]
fn test_lowest_restaurant_batch_drains_first() {
    let mut sim = two_restaurants();
    sim.run_until(14.5).unwrap();

    // At t=12 the buffer holds r1#0, r0#1, r1#1, r0#2; r1#2 was rejected
    assert_eq!(sim.statistics().restaurant(1).unwrap().rejected, 1);
    assert_eq!(served_sequence(&sim), vec![(0, 1), (0, 2), (1, 0)]);

    // Batch switched to restaurant 1 with r1#1 still waiting
    assert_eq!(sim.batch_info(), (Some(1), 1));
    assert_conserved(&sim);
}

#[test]
fn test_batch_info_counts_absorbed_arrivals() {
    let mut sim = two_restaurants();
    sim.run_until(14.5).unwrap();
    assert_eq!(sim.batch_info(), (Some(1), 1));

    // t=15: r1#3 joins the running batch behind r1#1, r0#3 waits
    sim.run_until(15.5).unwrap();
    assert_eq!(sim.batch_info(), (Some(1), 2));
    assert_eq!(sim.buffer().orders_of(1).len(), 2);
}

#[test]
fn test_running_batch_keeps_priority_and_absorbs_arrivals() {
    let mut sim = two_restaurants();
    sim.run_until(17.5).unwrap();

    // At t=15 r0#3 and r1#3 arrive; at t=17 restaurant 1's batch continues
    // even though restaurant 0 now has a waiting order
    assert_eq!(
        served_sequence(&sim),
        vec![(0, 1), (0, 2), (1, 0), (1, 1)]
    );
    assert_eq!(sim.batch_info(), (Some(1), 1));

    let waiting: Vec<(usize, u64)> = sim
        .buffer()
        .slots()
        .iter()
        .flatten()
        .map(|o| (o.restaurant_id(), o.order_id()))
        .collect();
    assert_eq!(waiting, vec![(0, 3), (1, 3)]);
    assert_conserved(&sim);
}

#[test]
fn test_wait_times_recorded_per_selection() {
    let mut sim = two_restaurants();
    sim.run_until(17.5).unwrap();

    let waits: Vec<f64> = sim
        .event_log()
        .events_of_kind(EventKind::OrderSelected)
        .iter()
        .map(|e| e.wait_time().unwrap())
        .collect();
    let expected = [7.0, 3.0, 14.0, 12.0];
    assert_eq!(waits.len(), expected.len());
    for (got, want) in waits.iter().zip(expected) {
        assert!((got - want).abs() < EPS, "wait {} != {}", got, want);
    }
}

// ============================================================================
// Run control and snapshots
// ============================================================================

#[test]
fn test_run_until_respects_horizon() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    sim.initialize(60.0).unwrap();

    let summary = sim.run_until(60.0).unwrap();

    assert_eq!(summary.steps, sim.step_count());
    assert!(summary.final_time <= 60.0);
    assert!(sim.next_event_time().unwrap() > 60.0);
    assert_eq!(sim.horizon(), 60.0);

    // 3 restaurants, arrivals at 0, 5, ..., 60
    assert_eq!(sim.statistics().total_orders(), 3 * 13);
}

#[test]
fn test_pending_events_are_ordered_and_read_only() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    sim.initialize(30.0).unwrap();
    sim.run_until(12.0).unwrap();

    let pending = sim.pending_events();
    assert_eq!(pending.len(), sim.pending_event_count());
    assert!(pending.windows(2).all(|w| w[0].time() <= w[1].time()));
    assert_eq!(sim.pending_events(), pending);
}

#[test]
fn test_initialize_restarts_the_run() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    sim.initialize(40.0).unwrap();
    sim.run_until(40.0).unwrap();
    let first = sim.statistics_summary();

    sim.initialize(40.0).unwrap();
    assert_eq!(sim.current_time(), 0.0);
    assert_eq!(sim.step_count(), 0);
    assert_eq!(sim.statistics().total_orders(), 0);
    assert!(sim.event_log().is_empty());
    assert!(sim.buffer().is_empty());
    assert!(sim.operators().iter().all(|op| !op.is_busy()));

    sim.run_until(40.0).unwrap();
    assert_eq!(sim.statistics_summary(), first);
}

#[test]
fn test_summary_covers_every_component() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    sim.initialize(50.0).unwrap();
    sim.run_until(50.0).unwrap();

    let summary = sim.statistics_summary();
    assert_eq!(summary.restaurants.len(), 3);
    assert_eq!(summary.operators.len(), 2);
    assert!(summary
        .operators
        .iter()
        .all(|op| (0.0..=1.0).contains(&op.utilization)));

    let generated: u64 = summary.restaurants.iter().map(|r| r.generated).sum();
    assert_eq!(generated, summary.total_orders);
    assert_eq!(summary.total_orders, summary.accounted_orders());
}
