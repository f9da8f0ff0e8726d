//! # Geofence Scenario Tests
//!
//! End-to-end walks through the trigger engine using only its public API:
//! a commute that approaches the destination, races between the two feeds,
//! snooze/re-alert cycles, and resets mid-alert.

use std::sync::Arc;

use proptest::prelude::*;

use travering_core::{Destination, GeofenceConfig, ManualClock, PositionSample, Timestamp};
use travering_state::{
    AckAction, FeedSource, GeofenceError, GeofenceEvent, GeofenceStateMachine, TriggerState,
};

fn start() -> Timestamp {
    Timestamp::parse("2026-03-02T08:00:00.000Z").unwrap()
}

fn sample(lat: f64, lon: f64) -> PositionSample {
    PositionSample {
        latitude: Some(lat),
        longitude: Some(lon),
        captured_at: None,
    }
}

fn tracking_machine(clock: Arc<ManualClock>, radius: f64, cooldown_ms: u64) -> GeofenceStateMachine {
    let mut m = GeofenceStateMachine::new(clock);
    m.set_destination(Destination::new(37.0, -122.0).unwrap());
    m.start_tracking(GeofenceConfig::new(radius, cooldown_ms).unwrap())
        .unwrap();
    m
}

#[test]
fn commute_approaching_destination_fires_exactly_once() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut m = tracking_machine(clock.clone(), 500.0, 29_000);

    // ~2.2 km south, closing in 200 m steps; both feeds report every step.
    let mut fired = Vec::new();
    for step in 0..15 {
        let lat = 37.0 - 0.02 + f64::from(step) * 0.0018;
        clock.advance_millis(5_000);
        for source in [FeedSource::Poll, FeedSource::Push] {
            if let Some(event) = m.on_position(sample(lat, -122.0), source) {
                fired.push(event);
            }
        }
    }

    assert_eq!(fired.len(), 1);
    assert!(fired[0].distance_meters <= 500.0);
    assert_eq!(m.session().trigger_count(), 1);
    assert_eq!(m.state(), TriggerState::Triggered);
}

#[test]
fn snooze_then_realert_after_cooldown_while_still_inside() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut m = tracking_machine(clock.clone(), 500.0, 29_000);

    let first = m.on_position(sample(37.0, -122.0), FeedSource::Poll).unwrap();
    assert!(m.acknowledge_ticket(first.ticket, AckAction::Snooze));

    for _ in 0..5 {
        clock.advance_millis(5_000);
        assert!(m.on_position(sample(37.0, -122.0), FeedSource::Poll).is_none());
    }
    clock.advance_millis(4_001);
    let second = m.on_position(sample(37.0, -122.0), FeedSource::Push).unwrap();
    assert_eq!(second.trigger_count, 2);
    assert_eq!(second.source, FeedSource::Push);

    assert!(m.acknowledge_ticket(second.ticket, AckAction::Stop));
    assert_eq!(m.state(), TriggerState::Idle);
    assert_eq!(m.session().trigger_count(), 0);
}

#[test]
fn minimum_radius_boundary() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut m = GeofenceStateMachine::new(clock);
    m.set_destination(Destination::new(37.0, -122.0).unwrap());

    let err = m
        .start_tracking(GeofenceConfig::new(5.0, 0).unwrap())
        .unwrap_err();
    assert!(matches!(err, GeofenceError::InvalidConfig(_)));
    assert!(m
        .start_tracking(GeofenceConfig::new(10.0, 0).unwrap())
        .is_ok());
}

#[test]
fn destination_change_mid_alert_invalidates_ticket() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut m = tracking_machine(clock, 500.0, 29_000);

    let stale = m.on_position(sample(37.0, -122.0), FeedSource::Poll).unwrap();
    m.set_destination(Destination::new(37.5, -122.0).unwrap());
    assert_eq!(m.state(), TriggerState::Armed);
    assert!(!m.is_current(stale.ticket));
    assert!(!m.acknowledge_ticket(stale.ticket, AckAction::Stop));
    assert!(m.is_tracking());
}

#[test]
fn events_serialize_for_the_ui() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut m = tracking_machine(clock, 500.0, 29_000);
    m.on_position(sample(37.0, -122.0), FeedSource::Poll).unwrap();

    let events = m.drain_events();
    let json = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(json["event"], "triggered");
    assert_eq!(json["trigger_count"], 1);
    assert_eq!(json["source"], "poll");
    assert!(matches!(events[0], GeofenceEvent::Idle));
}

proptest! {
    /// A sample farther than the radius never changes an armed machine.
    #[test]
    fn outside_radius_never_triggers(
        lat in -80.0f64..80.0,
        lon in -179.0f64..179.0,
        radius in 10.0f64..5_000.0,
    ) {
        let clock = Arc::new(ManualClock::new(start()));
        let mut m = tracking_machine(clock, radius, 0);
        let dest = Destination::new(37.0, -122.0).unwrap();
        let p = travering_core::Position::new(lat, lon, start()).unwrap();
        prop_assume!(travering_core::distance(&p, &dest) > radius);

        prop_assert!(m.on_position(sample(lat, lon), FeedSource::Poll).is_none());
        prop_assert_eq!(m.state(), TriggerState::Armed);
        prop_assert_eq!(m.session().trigger_count(), 0);
    }

    /// However many qualifying samples race in, one alert fires.
    #[test]
    fn burst_inside_radius_fires_once(sources in proptest::collection::vec(any::<bool>(), 1..20)) {
        let clock = Arc::new(ManualClock::new(start()));
        let mut m = tracking_machine(clock, 500.0, 29_000);
        let fired = sources
            .into_iter()
            .map(|poll| if poll { FeedSource::Poll } else { FeedSource::Push })
            .filter_map(|source| m.on_position(sample(37.0, -122.0), source))
            .count();
        prop_assert_eq!(fired, 1);
        prop_assert_eq!(m.session().trigger_count(), 1);
    }
}
