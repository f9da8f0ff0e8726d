//! # Mock Platform
//!
//! Scripted implementations of the platform seams. Each records what was
//! asked of it so tests can assert on the exact call sequence, and can be
//! told to fail, stay silent, hang, or panic.
//!
//! These are real implementations, not test-only stubs: the simulator uses
//! them to exercise the fallback chain without a device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ChannelFailure;
use crate::platform::{
    HapticDevice, PlaybackStatus, SoundAsset, SoundFactory, SoundResource, SystemNotifier,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Behaviour of a [`MockSound`].
#[derive(Debug, Clone, Default)]
pub struct SoundScript {
    /// Number of `load` calls that fail before loads start succeeding.
    pub load_failures: u32,
    /// `replay` succeeds but the resource never reports playing.
    pub silent: bool,
    /// `replay` returns an error.
    pub replay_error: bool,
    /// `replay` never completes.
    pub hang_on_replay: bool,
    /// `replay` panics.
    pub panic_on_replay: bool,
}

impl SoundScript {
    /// A sound that can never be loaded.
    pub fn broken() -> Self {
        Self {
            load_failures: u32::MAX,
            ..Self::default()
        }
    }
}

/// Shared record of calls made to a [`MockSound`].
#[derive(Debug, Clone, Default)]
pub struct SoundCalls(Arc<Mutex<Vec<&'static str>>>);

impl SoundCalls {
    fn push(&self, call: &'static str) {
        lock(&self.0).push(call);
    }

    /// Calls so far, oldest first.
    pub fn snapshot(&self) -> Vec<&'static str> {
        lock(&self.0).clone()
    }
}

/// A scripted [`SoundResource`].
#[derive(Debug)]
pub struct MockSound {
    script: SoundScript,
    loaded: bool,
    playing: bool,
    calls: SoundCalls,
    live: Option<Arc<AtomicUsize>>,
}

impl MockSound {
    pub fn new(script: SoundScript) -> Self {
        Self {
            script,
            loaded: false,
            playing: false,
            calls: SoundCalls::default(),
            live: None,
        }
    }

    /// Handle to this sound's call log.
    pub fn calls(&self) -> SoundCalls {
        self.calls.clone()
    }

    fn tracked(mut self, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        self.live = Some(live);
        self
    }
}

#[async_trait]
impl SoundResource for MockSound {
    async fn load(&mut self, _asset: &SoundAsset) -> Result<(), ChannelFailure> {
        self.calls.push("load");
        if self.script.load_failures > 0 {
            self.script.load_failures -= 1;
            return Err(ChannelFailure::Platform("decoder error".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), ChannelFailure> {
        self.calls.push("unload");
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
        if !self.loaded {
            return Err(ChannelFailure::NotLoaded);
        }
        self.loaded = false;
        self.playing = false;
        Ok(())
    }

    async fn replay(&mut self) -> Result<(), ChannelFailure> {
        self.calls.push("replay");
        if self.script.panic_on_replay {
            panic!("scripted replay panic");
        }
        if self.script.hang_on_replay {
            std::future::pending::<()>().await;
        }
        if self.script.replay_error {
            return Err(ChannelFailure::PlaybackFailed(
                "audio session interrupted".to_string(),
            ));
        }
        if !self.loaded {
            return Err(ChannelFailure::NotLoaded);
        }
        self.playing = !self.script.silent;
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus, ChannelFailure> {
        self.calls.push("status");
        Ok(PlaybackStatus {
            is_loaded: self.loaded,
            is_playing: self.playing,
        })
    }
}

/// A scripted [`SoundFactory`] that counts the instances it hands out.
#[derive(Debug, Default)]
pub struct MockSoundFactory {
    script: SoundScript,
    fail: bool,
    created: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl MockSoundFactory {
    /// Instances follow `script`.
    pub fn new(script: SoundScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Every `create` fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Instances successfully created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Created instances not yet unloaded.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoundFactory for MockSoundFactory {
    async fn create(
        &self,
        asset: &SoundAsset,
        auto_play: bool,
    ) -> Result<Box<dyn SoundResource>, ChannelFailure> {
        if self.fail {
            return Err(ChannelFailure::Unavailable("audio stack offline".to_string()));
        }
        let mut sound = MockSound::new(self.script.clone());
        sound.load(asset).await?;
        if auto_play {
            sound.replay().await?;
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(sound.tracked(self.live.clone())))
    }
}

/// A scripted [`HapticDevice`].
#[derive(Debug)]
pub struct MockHaptics {
    supported: bool,
    pulses: Mutex<Vec<Duration>>,
}

impl MockHaptics {
    pub fn working() -> Self {
        Self {
            supported: true,
            pulses: Mutex::new(Vec::new()),
        }
    }

    /// A device without a vibration motor.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            pulses: Mutex::new(Vec::new()),
        }
    }

    /// Pulses requested so far.
    pub fn pulses(&self) -> Vec<Duration> {
        lock(&self.pulses).clone()
    }
}

#[async_trait]
impl HapticDevice for MockHaptics {
    async fn vibrate(&self, pulse: Duration) -> Result<(), ChannelFailure> {
        if !self.supported {
            return Err(ChannelFailure::Unavailable("no vibration motor".to_string()));
        }
        lock(&self.pulses).push(pulse);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifierMode {
    Working,
    Failing,
    Hanging,
}

/// A scripted [`SystemNotifier`].
#[derive(Debug)]
pub struct MockNotifier {
    mode: NotifierMode,
    posted: Mutex<Vec<(String, String)>>,
}

impl MockNotifier {
    fn with_mode(mode: NotifierMode) -> Self {
        Self {
            mode,
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::with_mode(NotifierMode::Working)
    }

    /// Notification permission denied.
    pub fn failing() -> Self {
        Self::with_mode(NotifierMode::Failing)
    }

    /// `post` never completes.
    pub fn hanging() -> Self {
        Self::with_mode(NotifierMode::Hanging)
    }

    /// `(title, body)` pairs posted so far.
    pub fn posted(&self) -> Vec<(String, String)> {
        lock(&self.posted).clone()
    }
}

#[async_trait]
impl SystemNotifier for MockNotifier {
    async fn post(&self, title: &str, body: &str) -> Result<(), ChannelFailure> {
        match self.mode {
            NotifierMode::Working => {
                lock(&self.posted).push((title.to_string(), body.to_string()));
                Ok(())
            }
            NotifierMode::Failing => Err(ChannelFailure::Platform(
                "notification permission denied".to_string(),
            )),
            NotifierMode::Hanging => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
