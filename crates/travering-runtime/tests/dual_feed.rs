//! Both feeds report the same arrival; the user hears about it once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use travering_core::{Destination, GeofenceConfig, ManualClock, PositionSample, Settings, Timestamp};
use travering_notify::mock::{MockHaptics, MockNotifier, MockSound, MockSoundFactory, SoundScript};
use travering_notify::{DispatchOptions, NotificationDispatcher, Platform};
use travering_runtime::{
    GeofenceRuntime, LocationProvider, PollingFeed, PushFeed, RuntimeEvent,
};
use travering_state::{AckAction, GeofenceStateMachine, SourceFault, TriggerState};

struct AtDestination;

#[async_trait]
impl LocationProvider for AtDestination {
    async fn current_position(&self) -> Result<PositionSample, SourceFault> {
        Ok(PositionSample {
            latitude: Some(37.0005),
            longitude: Some(-122.0),
            captured_at: None,
        })
    }
}

fn dispatcher() -> NotificationDispatcher {
    NotificationDispatcher::standard(
        Platform {
            haptics: Arc::new(MockHaptics::working()),
            sound: Box::new(MockSound::new(SoundScript::default())),
            sound_factory: Arc::new(MockSoundFactory::new(SoundScript::default())),
            notifier: Arc::new(MockNotifier::working()),
        },
        DispatchOptions::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn racing_feeds_raise_one_alert() {
    let clock = Arc::new(ManualClock::new(
        Timestamp::parse("2026-03-02T08:00:00.000Z").unwrap(),
    ));
    let mut machine = GeofenceStateMachine::new(clock);
    machine.set_destination(Destination::new(37.0, -122.0).unwrap());
    machine
        .start_tracking(GeofenceConfig::new(500.0, 29_000).unwrap())
        .unwrap();

    let (push, push_feed) = PushFeed::channel(16, 0.0);
    let handle = GeofenceRuntime::new(machine, dispatcher(), Settings::default().alerts)
        .with_feed(PollingFeed::new(Arc::new(AtDestination), Duration::from_secs(5)))
        .with_feed(push_feed)
        .spawn();
    let mut events = handle.subscribe();

    for _ in 0..10 {
        assert!(push
            .sample(PositionSample {
                latitude: Some(37.0004),
                longitude: Some(-122.0),
                captured_at: None,
            })
            .await);
    }
    tokio::time::sleep(Duration::from_secs(20)).await;

    let mut reports = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let RuntimeEvent::Alert { report } = event {
            reports.push(report);
        }
    }
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].ticket.trigger_count, 1);
    assert!(reports[0].delivered());

    handle
        .acknowledge(reports[0].ticket, AckAction::Snooze)
        .await
        .unwrap();
    let machine = handle.shutdown().await.unwrap();
    assert_eq!(machine.state(), TriggerState::Snoozed);
    assert_eq!(machine.session().trigger_count(), 1);
}
