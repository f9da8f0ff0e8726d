//! Runs the bundled sample files through the library entry points the
//! binary uses.

use std::path::{Path, PathBuf};

use travering_cli::check::{check, CheckConfigArgs};
use travering_cli::load_settings;
use travering_cli::simulate::{simulate, SimulationSummary};
use travering_cli::track::Track;
use travering_state::{AckAction, GeofenceEvent, TriggerState};

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn sample_settings_are_valid() {
    let settings = check(&CheckConfigArgs {
        path: data("travering.yaml"),
    })
    .unwrap();
    assert_eq!(settings.geofence.radius_meters, 400.0);
}

#[test]
fn missing_settings_file_is_an_error() {
    assert!(load_settings(Some(data("does-not-exist.yaml").as_path())).is_err());
    assert!(load_settings(None).is_ok());
}

#[tokio::test]
async fn commute_alerts_once_and_stops() {
    let settings = load_settings(Some(data("travering.yaml").as_path())).unwrap();
    let track = Track::load(&data("commute.yaml")).unwrap();

    let summary = simulate(&track, &settings, Some(AckAction::Stop), false)
        .await
        .unwrap();

    assert_eq!(summary.alerts.len(), 1);
    assert_eq!(summary.final_state, TriggerState::Idle);
    // 36.997 is ~334 m out, the first waypoint inside 400 m.
    let trigger = summary
        .events
        .iter()
        .find_map(|e| match e {
            GeofenceEvent::Triggered(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert!(trigger.distance_meters < 400.0 && trigger.distance_meters > 300.0);

    assert!(summary
        .events
        .iter()
        .any(|e| matches!(e, GeofenceEvent::SourceError { .. })));

    let condensed = SimulationSummary::from(&summary);
    assert_eq!(condensed.delivered_by, vec![Some("primary_audio".to_string())]);
    assert!(!condensed.tracking);
}

#[tokio::test]
async fn commute_snoozed_realerts_after_cooldown() {
    let settings = load_settings(Some(data("travering.yaml").as_path())).unwrap();
    let track = Track::load(&data("commute.yaml")).unwrap();

    let summary = simulate(&track, &settings, Some(AckAction::Snooze), false)
        .await
        .unwrap();

    // First alert at 08:00:30, snoozed; re-alert at 08:01:00.
    assert_eq!(summary.alerts.len(), 2);
    assert_eq!(summary.alerts[1].ticket.trigger_count, 2);
    assert_eq!(summary.final_state, TriggerState::Snoozed);
}
