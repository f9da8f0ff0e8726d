//! # travering-runtime — Feeds, Consumer Loop, Replay
//!
//! Puts the geofence state machine to work.
//!
//! Two producers (the poll timer and the push subscription) race to deliver
//! position samples. Rather than sharing the machine behind a lock, every
//! input funnels through one channel into a single consumer task that owns
//! the machine outright; the check-and-set on `trigger_in_flight` therefore
//! never interleaves. Alert dispatch runs in its own task and reports back
//! through the same channel, so a slow or hanging channel never stalls
//! sample processing.
//!
//! [`replay`] drives the same machine and dispatcher in lockstep over a
//! recorded track, for simulation and deterministic tests.

pub mod command;
pub mod error;
pub mod feed;
pub mod replay;
pub mod runtime;

pub use command::{Command, RuntimeEvent};
pub use error::RuntimeError;
pub use feed::{
    FeedMessage, LocationProvider, MovementFilter, PollingFeed, PositionFeed, PushFeed, PushSender,
    ReplayFeed,
};
pub use replay::{replay, ReplayStep, ReplaySummary};
pub use runtime::{GeofenceRuntime, RuntimeHandle};
