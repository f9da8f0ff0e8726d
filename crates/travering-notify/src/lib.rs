//! # travering-notify — Alert Dispatch
//!
//! Turns a geofence trigger into something the user notices, even when the
//! audio stack misbehaves.
//!
//! ## Architecture
//!
//! - **Platform** (`platform.rs`): the device seams: `HapticDevice`,
//!   `SoundResource`, `SoundFactory`, `SystemNotifier`.
//!
//! - **Channels** (`channel.rs`): the `AlertChannel` contract and the five
//!   standard channels built on the platform seams.
//!
//! - **Dispatcher** (`dispatcher.rs`): runs the chain in order, each attempt
//!   in its own task under a timeout, stops at the first delivering success
//!   and always returns the Snooze/Stop prompt.
//!
//! - **Alert** (`alert.rs`): the alert payload and the prompt that routes
//!   the user's answer back to the state machine.
//!
//! - **Mock** (`mock.rs`): scripted platform implementations for tests and
//!   development.
//!
//! ## Crate Policy
//!
//! - Channel failures are logged and counted, never returned to callers.
//! - Only channels touch the shared sound resource.

pub mod alert;
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod platform;

pub use alert::{Alert, AlertPrompt};
pub use channel::{
    AlertChannel, ChannelRole, FreshAudioChannel, HapticChannel, PrimaryAudioChannel,
    ReloadAudioChannel, SystemNotificationChannel,
};
pub use dispatcher::{
    AttemptOutcome, ChannelAttempt, DispatchOptions, DispatchReport, NotificationDispatcher,
};
pub use error::ChannelFailure;
pub use platform::{
    HapticDevice, Platform, PlaybackStatus, SharedSound, SoundAsset, SoundFactory, SoundResource,
    SystemNotifier,
};
