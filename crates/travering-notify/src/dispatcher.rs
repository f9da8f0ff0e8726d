//! # Notification Dispatcher
//!
//! Runs the channel chain for one alert.
//!
//! ## Invariants
//!
//! - Channels run strictly in order; at most one attempt is in flight.
//! - Each attempt runs in its own task under the channel timeout, so a
//!   channel that hangs or panics costs at most one timeout and the chain
//!   continues.
//! - The chain stops at the first success of a [`ChannelRole::Delivering`]
//!   channel. Accompanying channels never stop it.
//! - [`NotificationDispatcher::fire`] always returns a prompt, even when
//!   every channel failed. The prompt is the user's only way out of
//!   `TRIGGERED`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use travering_core::settings::AlertSettings;
use travering_state::AlertTicket;

use crate::alert::{Alert, AlertPrompt};
use crate::channel::{
    AlertChannel, ChannelRole, FreshAudioChannel, HapticChannel, PrimaryAudioChannel,
    ReloadAudioChannel, SystemNotificationChannel,
};
use crate::error::ChannelFailure;
use crate::platform::{Platform, SharedSound, SoundAsset};

/// Dispatch tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound on a single channel attempt.
    pub channel_timeout: Duration,
    /// Length of the haptic pulse.
    pub haptic_pulse: Duration,
    /// Alarm sound location.
    pub sound_asset: SoundAsset,
}

impl DispatchOptions {
    pub fn from_settings(settings: &AlertSettings) -> Self {
        Self {
            channel_timeout: Duration::from_millis(settings.channel_timeout_ms),
            haptic_pulse: Duration::from_millis(settings.haptic_pulse_ms),
            sound_asset: SoundAsset(settings.sound_asset.clone()),
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_settings(&AlertSettings::default())
    }
}

/// Result of one channel attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Delivered,
    Failed { reason: String },
}

/// One row of a [`DispatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAttempt {
    pub channel: String,
    pub role: ChannelRole,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

/// What happened when an alert was fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub alert_id: Uuid,
    pub ticket: AlertTicket,
    /// Attempts in the order they ran.
    pub attempts: Vec<ChannelAttempt>,
    /// The delivering channel that succeeded, if any.
    pub delivered_by: Option<String>,
    /// The Snooze/Stop prompt. Always present.
    pub prompt: AlertPrompt,
}

impl DispatchReport {
    pub fn delivered(&self) -> bool {
        self.delivered_by.is_some()
    }
}

/// Fires alerts through an ordered chain of channels.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
    channel_timeout: Duration,
    shared_sound: Option<(SharedSound, SoundAsset)>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.channels.iter().map(|c| c.name()).collect();
        f.debug_struct("NotificationDispatcher")
            .field("channels", &names)
            .field("channel_timeout", &self.channel_timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// A dispatcher over an arbitrary chain.
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>, channel_timeout: Duration) -> Self {
        Self {
            channels,
            channel_timeout,
            shared_sound: None,
        }
    }

    /// The standard five-channel chain over `platform`.
    pub fn standard(platform: Platform, options: DispatchOptions) -> Self {
        let sound: SharedSound = Arc::new(Mutex::new(platform.sound));
        let asset = options.sound_asset;
        let channels: Vec<Arc<dyn AlertChannel>> = vec![
            Arc::new(HapticChannel::new(platform.haptics, options.haptic_pulse)),
            Arc::new(PrimaryAudioChannel::new(sound.clone())),
            Arc::new(ReloadAudioChannel::new(sound.clone(), asset.clone())),
            Arc::new(FreshAudioChannel::new(platform.sound_factory, asset.clone())),
            Arc::new(SystemNotificationChannel::new(platform.notifier)),
        ];
        Self {
            channels,
            channel_timeout: options.channel_timeout,
            shared_sound: Some((sound, asset)),
        }
    }

    /// Channel names in dispatch order.
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Pre-load the shared sound. A failure is logged; the reload channel
    /// gets another chance at fire time.
    pub async fn prepare(&self) -> Result<(), ChannelFailure> {
        let Some((sound, asset)) = &self.shared_sound else {
            return Ok(());
        };
        let result = sound.lock().await.load(asset).await;
        match &result {
            Ok(()) => tracing::debug!(%asset, "alarm sound preloaded"),
            Err(failure) => tracing::warn!(%asset, %failure, "alarm sound preload failed"),
        }
        result
    }

    /// Release every sound resource.
    pub async fn shutdown(&self) {
        for channel in &self.channels {
            channel.release().await;
        }
        if let Some((sound, _)) = &self.shared_sound {
            if let Err(failure) = sound.lock().await.unload().await {
                tracing::debug!(%failure, "alarm sound unload failed");
            }
        }
    }

    /// Deliver `alert` and return the report with its prompt.
    pub async fn fire(&self, alert: Alert) -> DispatchReport {
        let mut attempts = Vec::with_capacity(self.channels.len());
        let mut delivered_by: Option<String> = None;

        for channel in &self.channels {
            let role = channel.role();
            if delivered_by.is_some() && role == ChannelRole::Delivering {
                break;
            }

            let started = Instant::now();
            let result = self.run_attempt(channel.clone(), &alert).await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let name = channel.name();

            let outcome = match result {
                Ok(()) => {
                    tracing::info!(alert_id = %alert.id, channel = name, elapsed_ms, "alert channel succeeded");
                    if role == ChannelRole::Delivering {
                        metrics::counter!("travering_alerts_delivered_total", "channel" => name)
                            .increment(1);
                        delivered_by = Some(name.to_string());
                    }
                    AttemptOutcome::Delivered
                }
                Err(failure) => {
                    metrics::counter!("travering_channel_failures_total", "channel" => name)
                        .increment(1);
                    match role {
                        ChannelRole::Delivering => tracing::warn!(
                            alert_id = %alert.id, channel = name, %failure,
                            "alert channel failed, falling back"
                        ),
                        ChannelRole::Accompanying => tracing::debug!(
                            alert_id = %alert.id, channel = name, %failure,
                            "accompanying channel failed"
                        ),
                    }
                    AttemptOutcome::Failed {
                        reason: failure.to_string(),
                    }
                }
            };

            attempts.push(ChannelAttempt {
                channel: name.to_string(),
                role,
                outcome,
                elapsed_ms,
            });
        }

        if delivered_by.is_none() {
            tracing::error!(
                alert_id = %alert.id,
                ticket = %alert.ticket,
                "every alert channel failed; only the prompt remains"
            );
        }

        DispatchReport {
            alert_id: alert.id,
            ticket: alert.ticket,
            attempts,
            delivered_by,
            prompt: AlertPrompt::for_alert(&alert),
        }
    }

    async fn run_attempt(
        &self,
        channel: Arc<dyn AlertChannel>,
        alert: &Alert,
    ) -> Result<(), ChannelFailure> {
        let timeout = self.channel_timeout;
        let alert = alert.clone();
        let task =
            tokio::spawn(async move { tokio::time::timeout(timeout, channel.attempt(&alert)).await });

        match task.await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(ChannelFailure::TimedOut {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Err(join_error) => Err(ChannelFailure::Panicked(join_error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use travering_core::{Destination, GeofenceConfig, ManualClock, PositionSample, Settings, Timestamp};
    use travering_state::{AckAction, FeedSource, GeofenceStateMachine, TriggerEvent, TriggerState};

    use super::*;
    use crate::mock::{MockHaptics, MockNotifier, MockSound, MockSoundFactory, SoundScript};

    fn platform(sound: SoundScript, factory: MockSoundFactory, notifier: MockNotifier) -> Platform {
        Platform {
            haptics: Arc::new(MockHaptics::working()),
            sound: Box::new(MockSound::new(sound)),
            sound_factory: Arc::new(factory),
            notifier: Arc::new(notifier),
        }
    }

    fn triggered() -> (GeofenceStateMachine, TriggerEvent) {
        let start = Timestamp::parse("2026-03-02T08:00:00.000Z").unwrap();
        let mut m = GeofenceStateMachine::new(Arc::new(ManualClock::new(start)));
        m.set_destination(Destination::new(37.0, -122.0).unwrap());
        m.start_tracking(GeofenceConfig::new(500.0, 29_000).unwrap())
            .unwrap();
        let event = m
            .on_position(PositionSample::at(37.0, -122.0, start), FeedSource::Poll)
            .unwrap();
        (m, event)
    }

    fn alert_for(event: &TriggerEvent) -> Alert {
        Alert::from_trigger(event, &Settings::default().alerts)
    }

    fn names(report: &DispatchReport) -> Vec<&str> {
        report.attempts.iter().map(|a| a.channel.as_str()).collect()
    }

    #[tokio::test]
    async fn standard_chain_order() {
        let d = NotificationDispatcher::standard(
            platform(SoundScript::default(), MockSoundFactory::default(), MockNotifier::working()),
            DispatchOptions::default(),
        );
        assert_eq!(
            d.channel_names(),
            vec!["haptic", "primary_audio", "reload_audio", "fresh_audio", "system_notification"]
        );
    }

    #[tokio::test]
    async fn preloaded_sound_stops_chain_at_primary() {
        let d = NotificationDispatcher::standard(
            platform(SoundScript::default(), MockSoundFactory::default(), MockNotifier::working()),
            DispatchOptions::default(),
        );
        d.prepare().await.unwrap();
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(names(&report), vec!["haptic", "primary_audio"]);
        assert_eq!(report.delivered_by.as_deref(), Some("primary_audio"));
        assert_eq!(report.prompt.ticket, event.ticket);
    }

    #[tokio::test]
    async fn failed_preload_falls_back_to_reload() {
        let d = NotificationDispatcher::standard(
            platform(
                SoundScript {
                    load_failures: 1,
                    ..SoundScript::default()
                },
                MockSoundFactory::default(),
                MockNotifier::working(),
            ),
            DispatchOptions::default(),
        );
        assert!(d.prepare().await.is_err());
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(names(&report), vec!["haptic", "primary_audio", "reload_audio"]);
        assert_eq!(report.delivered_by.as_deref(), Some("reload_audio"));
        assert!(matches!(
            report.attempts[1].outcome,
            AttemptOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn broken_shared_sound_falls_back_to_fresh_instance() {
        let factory = MockSoundFactory::new(SoundScript::default());
        let d = NotificationDispatcher::standard(
            platform(SoundScript::broken(), factory, MockNotifier::working()),
            DispatchOptions::default(),
        );
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(report.delivered_by.as_deref(), Some("fresh_audio"));
        assert_eq!(report.attempts.len(), 4);
    }

    #[tokio::test]
    async fn no_audio_falls_back_to_system_notification() {
        let notifier = MockNotifier::working();
        let d = NotificationDispatcher::standard(
            platform(SoundScript::broken(), MockSoundFactory::failing(), notifier),
            DispatchOptions::default(),
        );
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(report.delivered_by.as_deref(), Some("system_notification"));
        assert_eq!(report.attempts.len(), 5);
    }

    #[tokio::test]
    async fn every_channel_failing_still_returns_prompt() {
        let mut p = platform(SoundScript::broken(), MockSoundFactory::failing(), MockNotifier::failing());
        p.haptics = Arc::new(MockHaptics::unsupported());
        let d = NotificationDispatcher::standard(p, DispatchOptions::default());
        let (mut m, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert!(!report.delivered());
        assert_eq!(report.attempts.len(), 5);
        assert!(report
            .attempts
            .iter()
            .all(|a| matches!(a.outcome, AttemptOutcome::Failed { .. })));
        assert_eq!(m.state(), TriggerState::Triggered);

        assert!(report.prompt.respond(&mut m, AckAction::Stop));
        assert_eq!(m.state(), TriggerState::Idle);
    }

    #[tokio::test]
    async fn haptic_success_does_not_count_as_delivery() {
        let d = NotificationDispatcher::standard(
            platform(SoundScript::broken(), MockSoundFactory::failing(), MockNotifier::failing()),
            DispatchOptions::default(),
        );
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(report.attempts[0].outcome, AttemptOutcome::Delivered);
        assert!(!report.delivered());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_channel_times_out_and_chain_continues() {
        let mut sound = SoundScript::default();
        sound.hang_on_replay = true;
        let d = NotificationDispatcher::standard(
            platform(sound, MockSoundFactory::default(), MockNotifier::working()),
            DispatchOptions::default(),
        );
        d.prepare().await.unwrap();
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert_eq!(
            report.attempts[1].outcome,
            AttemptOutcome::Failed {
                reason: "timed out after 5000 ms".to_string()
            }
        );
        assert_eq!(report.delivered_by.as_deref(), Some("fresh_audio"));
    }

    #[tokio::test]
    async fn panicking_channel_is_isolated() {
        let mut sound = SoundScript::default();
        sound.panic_on_replay = true;
        let d = NotificationDispatcher::standard(
            platform(sound, MockSoundFactory::default(), MockNotifier::working()),
            DispatchOptions::default(),
        );
        d.prepare().await.unwrap();
        let (_, event) = triggered();

        let report = d.fire(alert_for(&event)).await;
        assert!(matches!(
            &report.attempts[1].outcome,
            AttemptOutcome::Failed { reason } if reason.starts_with("channel panicked")
        ));
        assert_eq!(report.delivered_by.as_deref(), Some("fresh_audio"));
    }

    #[tokio::test]
    async fn shutdown_releases_fresh_instance() {
        let factory = Arc::new(MockSoundFactory::new(SoundScript::default()));
        let channels: Vec<Arc<dyn AlertChannel>> = vec![Arc::new(FreshAudioChannel::new(
            factory.clone(),
            SoundAsset("assets/alarm.mp3".to_string()),
        ))];
        let d = NotificationDispatcher::new(channels, Duration::from_secs(1));
        let (_, event) = triggered();

        d.fire(alert_for(&event)).await;
        assert_eq!(factory.live(), 1);
        d.shutdown().await;
        assert_eq!(factory.live(), 0);
    }

    #[test]
    fn report_serializes_outcomes_inline() {
        let attempt = ChannelAttempt {
            channel: "primary_audio".to_string(),
            role: ChannelRole::Delivering,
            outcome: AttemptOutcome::Failed {
                reason: "sound not loaded".to_string(),
            },
            elapsed_ms: 3,
        };
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["reason"], "sound not loaded");
        assert_eq!(json["role"], "delivering");
    }
}
