//! Tests for periodic arrival sources

use smo_simulator_core_rs::models::EventKind;
use smo_simulator_core_rs::ArrivalSource;

#[test]
fn test_first_order_at_time_zero() {
    let mut source = ArrivalSource::new(2, 5.0);
    let event = source.generate_next();

    assert_eq!(event.kind(), EventKind::OrderGenerated);
    assert_eq!(event.time(), 0.0);
    assert_eq!(event.restaurant_id(), 2);
    assert_eq!(event.order_id(), 0);
}

#[test]
fn test_fixed_period_and_increasing_ids() {
    let mut source = ArrivalSource::new(0, 2.5);

    let events: Vec<_> = (0..4).map(|_| source.generate_next()).collect();
    let times: Vec<f64> = events.iter().map(|e| e.time()).collect();
    let ids: Vec<u64> = events.iter().map(|e| e.order_id()).collect();

    assert_eq!(times, vec![0.0, 2.5, 5.0, 7.5]);
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(source.generated_count(), 4);
    assert_eq!(source.next_generation_time(), 10.0);
}

#[test]
fn test_sources_number_independently() {
    let mut sources = ArrivalSource::for_restaurants(2, 1.0);

    sources[0].generate_next();
    sources[0].generate_next();
    let first_of_r1 = sources[1].generate_next();

    assert_eq!(first_of_r1.order_id(), 0);
    assert_eq!(sources[0].generated_count(), 2);
}

#[test]
fn test_reset_restores_initial_state() {
    let mut source = ArrivalSource::new(1, 3.0);
    for _ in 0..5 {
        source.generate_next();
    }

    source.reset();
    assert_eq!(source, ArrivalSource::new(1, 3.0));
}

#[test]
#[should_panic(expected = "arrival interval must be positive")]
fn test_negative_interval_panics() {
    ArrivalSource::new(0, -1.0);
}
