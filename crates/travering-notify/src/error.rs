//! # Channel Failures
//!
//! Every way a single delivery attempt can fail. These are recovered inside
//! the dispatcher by moving on to the next channel; they are logged, never
//! returned to the caller of `fire`.

use thiserror::Error;

/// A failed delivery attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelFailure {
    /// The device lacks the capability (no vibration motor, no audio stack).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The sound resource is not loaded.
    #[error("sound not loaded")]
    NotLoaded,

    /// Play was requested but the resource does not report playing.
    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    /// The attempt did not finish within the channel timeout.
    #[error("timed out after {after_ms} ms")]
    TimedOut {
        /// The timeout that elapsed.
        after_ms: u64,
    },

    /// The attempt panicked.
    #[error("channel panicked: {0}")]
    Panicked(String),

    /// Any other platform error.
    #[error("platform error: {0}")]
    Platform(String),
}
