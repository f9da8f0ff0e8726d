//! # Platform Seams
//!
//! Traits over the device capabilities the channels use. Implementations
//! must be `Send + Sync` so they can be shared across tasks behind an
//! `Arc`, and object-safe so the dispatcher can hold them as trait objects
//! chosen at runtime (mock, console, real device).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ChannelFailure;

/// Location of the alarm sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundAsset(pub String);

impl SoundAsset {
    /// The asset path or URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SoundAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported by a sound resource after a play request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// The resource holds decoded audio.
    pub is_loaded: bool,
    /// The resource is currently producing sound.
    pub is_playing: bool,
}

impl PlaybackStatus {
    /// Whether the user can hear it.
    pub fn is_audible(&self) -> bool {
        self.is_loaded && self.is_playing
    }
}

/// Vibration hardware.
#[async_trait]
pub trait HapticDevice: Send + Sync {
    /// Start a vibration pulse of the given length. Returns once the pulse
    /// has been requested, not when it ends.
    async fn vibrate(&self, pulse: Duration) -> Result<(), ChannelFailure>;
}

/// A loadable, replayable sound.
#[async_trait]
pub trait SoundResource: Send + Sync {
    /// Load audio from `asset`.
    async fn load(&mut self, asset: &SoundAsset) -> Result<(), ChannelFailure>;

    /// Release the loaded audio.
    async fn unload(&mut self) -> Result<(), ChannelFailure>;

    /// Play from the beginning.
    async fn replay(&mut self) -> Result<(), ChannelFailure>;

    /// Current load/playback status.
    async fn status(&self) -> Result<PlaybackStatus, ChannelFailure>;
}

/// Builds independent sound instances.
#[async_trait]
pub trait SoundFactory: Send + Sync {
    /// Create and load a new instance, starting playback immediately when
    /// `auto_play` is set.
    async fn create(
        &self,
        asset: &SoundAsset,
        auto_play: bool,
    ) -> Result<Box<dyn SoundResource>, ChannelFailure>;
}

/// Platform notification center.
#[async_trait]
pub trait SystemNotifier: Send + Sync {
    /// Post a notification immediately.
    async fn post(&self, title: &str, body: &str) -> Result<(), ChannelFailure>;
}

/// The sound instance shared by every alert occurrence.
pub type SharedSound = Arc<Mutex<Box<dyn SoundResource>>>;

/// The device capabilities a dispatcher is built from.
pub struct Platform {
    /// Vibration hardware.
    pub haptics: Arc<dyn HapticDevice>,
    /// The long-lived, pre-loaded alarm sound.
    pub sound: Box<dyn SoundResource>,
    /// Source of fresh sound instances.
    pub sound_factory: Arc<dyn SoundFactory>,
    /// Notification center.
    pub notifier: Arc<dyn SystemNotifier>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
