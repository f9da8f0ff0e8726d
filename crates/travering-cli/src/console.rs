//! # Console Platform
//!
//! Platform implementations that narrate to stderr instead of touching
//! hardware, so a simulation shows which channel actually fired.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use travering_notify::{
    ChannelFailure, HapticDevice, Platform, PlaybackStatus, SoundAsset, SoundFactory,
    SoundResource, SystemNotifier,
};

pub struct ConsoleHaptics;

#[async_trait]
impl HapticDevice for ConsoleHaptics {
    async fn vibrate(&self, pulse: Duration) -> Result<(), ChannelFailure> {
        eprintln!("[haptic] buzzing for {} ms", pulse.as_millis());
        Ok(())
    }
}

/// A sound that "plays" by printing. With `muted` set it refuses to load,
/// standing in for a device whose audio stack is broken.
pub struct ConsoleSound {
    label: &'static str,
    muted: bool,
    status: PlaybackStatus,
}

impl ConsoleSound {
    pub fn new(label: &'static str, muted: bool) -> Self {
        Self {
            label,
            muted,
            status: PlaybackStatus::default(),
        }
    }
}

#[async_trait]
impl SoundResource for ConsoleSound {
    async fn load(&mut self, asset: &SoundAsset) -> Result<(), ChannelFailure> {
        if self.muted {
            return Err(ChannelFailure::Unavailable(format!(
                "audio output disabled, cannot load {asset}"
            )));
        }
        self.status.is_loaded = true;
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), ChannelFailure> {
        self.status = PlaybackStatus::default();
        Ok(())
    }

    async fn replay(&mut self) -> Result<(), ChannelFailure> {
        if !self.status.is_loaded {
            return Err(ChannelFailure::NotLoaded);
        }
        eprintln!("[{}] ringing", self.label);
        self.status.is_playing = true;
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus, ChannelFailure> {
        Ok(self.status)
    }
}

pub struct ConsoleSoundFactory {
    muted: bool,
}

#[async_trait]
impl SoundFactory for ConsoleSoundFactory {
    async fn create(
        &self,
        asset: &SoundAsset,
        auto_play: bool,
    ) -> Result<Box<dyn SoundResource>, ChannelFailure> {
        let mut sound = ConsoleSound::new("fresh sound", self.muted);
        sound.load(asset).await?;
        if auto_play {
            sound.replay().await?;
        }
        Ok(Box::new(sound))
    }
}

pub struct ConsoleNotifier;

#[async_trait]
impl SystemNotifier for ConsoleNotifier {
    async fn post(&self, title: &str, body: &str) -> Result<(), ChannelFailure> {
        eprintln!("[notification] {title}: {body}");
        Ok(())
    }
}

/// The console platform. `fail_audio` breaks every sound so the chain
/// falls through to the system notification.
pub fn console_platform(fail_audio: bool) -> Platform {
    Platform {
        haptics: Arc::new(ConsoleHaptics),
        sound: Box::new(ConsoleSound::new("alarm sound", fail_audio)),
        sound_factory: Arc::new(ConsoleSoundFactory { muted: fail_audio }),
        notifier: Arc::new(ConsoleNotifier),
    }
}
