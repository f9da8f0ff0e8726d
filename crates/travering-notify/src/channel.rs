//! # Alert Channels
//!
//! One delivery mechanism per channel, each a thin adapter over a platform
//! seam. The standard chain, in dispatch order:
//!
//! | # | Channel                | Role         | Mechanism                                  |
//! |---|------------------------|--------------|--------------------------------------------|
//! | 1 | `haptic`               | accompanying | vibration pulse                            |
//! | 2 | `primary_audio`        | delivering   | replay the shared, pre-loaded sound        |
//! | 3 | `reload_audio`         | delivering   | unload, reload and replay the shared sound |
//! | 4 | `fresh_audio`          | delivering   | create a new auto-playing sound instance   |
//! | 5 | `system_notification`  | delivering   | post an immediate OS notification          |
//!
//! Audio channels only report success once the resource says it is both
//! loaded and playing; a play call that returns quietly is not delivery.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::alert::Alert;
use crate::error::ChannelFailure;
use crate::platform::{
    HapticDevice, PlaybackStatus, SharedSound, SoundAsset, SoundFactory, SoundResource,
    SystemNotifier,
};

/// How a channel's success counts toward delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Fires alongside the others; success never ends the chain.
    Accompanying,
    /// Success means the user has been alerted; the chain stops.
    Delivering,
}

/// A single delivery mechanism.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Stable name used in logs, metrics and reports.
    fn name(&self) -> &'static str;

    /// Whether success ends the chain.
    fn role(&self) -> ChannelRole {
        ChannelRole::Delivering
    }

    /// Try to deliver `alert`.
    async fn attempt(&self, alert: &Alert) -> Result<(), ChannelFailure>;

    /// Release anything the channel holds between alerts.
    async fn release(&self) {}
}

fn require_audible(status: PlaybackStatus) -> Result<(), ChannelFailure> {
    if !status.is_loaded {
        return Err(ChannelFailure::NotLoaded);
    }
    if !status.is_playing {
        return Err(ChannelFailure::PlaybackFailed(
            "resource reports not playing".to_string(),
        ));
    }
    Ok(())
}

// ─── Haptic ──────────────────────────────────────────────────────────

/// Vibrates the device.
pub struct HapticChannel {
    device: Arc<dyn HapticDevice>,
    pulse: Duration,
}

impl HapticChannel {
    pub fn new(device: Arc<dyn HapticDevice>, pulse: Duration) -> Self {
        Self { device, pulse }
    }
}

#[async_trait]
impl AlertChannel for HapticChannel {
    fn name(&self) -> &'static str {
        "haptic"
    }

    fn role(&self) -> ChannelRole {
        ChannelRole::Accompanying
    }

    async fn attempt(&self, _alert: &Alert) -> Result<(), ChannelFailure> {
        self.device.vibrate(self.pulse).await
    }
}

// ─── Shared sound ────────────────────────────────────────────────────

/// Replays the shared sound loaded ahead of time.
pub struct PrimaryAudioChannel {
    sound: SharedSound,
}

impl PrimaryAudioChannel {
    pub fn new(sound: SharedSound) -> Self {
        Self { sound }
    }
}

#[async_trait]
impl AlertChannel for PrimaryAudioChannel {
    fn name(&self) -> &'static str {
        "primary_audio"
    }

    async fn attempt(&self, _alert: &Alert) -> Result<(), ChannelFailure> {
        let mut sound = self.sound.lock().await;
        sound.replay().await?;
        require_audible(sound.status().await?)
    }
}

/// Forces a reload of the shared sound, then replays it.
pub struct ReloadAudioChannel {
    sound: SharedSound,
    asset: SoundAsset,
}

impl ReloadAudioChannel {
    pub fn new(sound: SharedSound, asset: SoundAsset) -> Self {
        Self { sound, asset }
    }
}

#[async_trait]
impl AlertChannel for ReloadAudioChannel {
    fn name(&self) -> &'static str {
        "reload_audio"
    }

    async fn attempt(&self, _alert: &Alert) -> Result<(), ChannelFailure> {
        let mut sound = self.sound.lock().await;
        // A resource that was never loaded may refuse to unload.
        if let Err(failure) = sound.unload().await {
            tracing::debug!(%failure, "unload before reload failed");
        }
        sound.load(&self.asset).await?;
        sound.replay().await?;
        require_audible(sound.status().await?)
    }
}

// ─── Fresh instance ──────────────────────────────────────────────────

/// Builds a brand-new auto-playing sound, independent of the shared one.
///
/// The instance that last played is kept alive until the next attempt or
/// [`AlertChannel::release`], since dropping it would cut the sound off.
pub struct FreshAudioChannel {
    factory: Arc<dyn SoundFactory>,
    asset: SoundAsset,
    live: Mutex<Option<Box<dyn SoundResource>>>,
}

impl FreshAudioChannel {
    pub fn new(factory: Arc<dyn SoundFactory>, asset: SoundAsset) -> Self {
        Self {
            factory,
            asset,
            live: Mutex::new(None),
        }
    }

    async fn unload_live(live: &mut Option<Box<dyn SoundResource>>) {
        if let Some(mut previous) = live.take() {
            if let Err(failure) = previous.unload().await {
                tracing::debug!(%failure, "failed to unload previous fresh sound");
            }
        }
    }
}

#[async_trait]
impl AlertChannel for FreshAudioChannel {
    fn name(&self) -> &'static str {
        "fresh_audio"
    }

    async fn attempt(&self, _alert: &Alert) -> Result<(), ChannelFailure> {
        let mut live = self.live.lock().await;
        Self::unload_live(&mut live).await;

        let mut instance = self.factory.create(&self.asset, true).await?;
        if let Err(failure) = instance.status().await.and_then(require_audible) {
            // Not kept, so it must not outlive this attempt.
            if let Err(unload) = instance.unload().await {
                tracing::debug!(failure = %unload, "failed to unload rejected fresh sound");
            }
            return Err(failure);
        }
        *live = Some(instance);
        Ok(())
    }

    async fn release(&self) {
        let mut live = self.live.lock().await;
        Self::unload_live(&mut live).await;
    }
}

// ─── System notification ─────────────────────────────────────────────

/// Posts an immediate OS notification.
pub struct SystemNotificationChannel {
    notifier: Arc<dyn SystemNotifier>,
}

impl SystemNotificationChannel {
    pub fn new(notifier: Arc<dyn SystemNotifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl AlertChannel for SystemNotificationChannel {
    fn name(&self) -> &'static str {
        "system_notification"
    }

    async fn attempt(&self, alert: &Alert) -> Result<(), ChannelFailure> {
        self.notifier.post(&alert.title, &alert.message).await
    }
}
