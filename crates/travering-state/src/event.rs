//! # Events and Inputs
//!
//! Values flowing into the state machine (feed identifiers, user actions,
//! source faults) and out of it (state-change events, transition records).

use serde::{Deserialize, Serialize};

use travering_core::{Position, Timestamp};

use crate::session::{AlertTicket, TriggerState};

/// Which position feed produced a sample. Used for logging only; both
/// feeds are equally authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// Fixed-interval poll timer.
    Poll,
    /// Continuous push subscription.
    Push,
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poll => f.write_str("poll"),
            Self::Push => f.write_str("push"),
        }
    }
}

/// The user's answer to an alert prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckAction {
    /// Defer; re-alert only after the cooldown.
    Snooze,
    /// Stop tracking altogether.
    Stop,
}

impl std::fmt::Display for AckAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snooze => f.write_str("Snooze"),
            Self::Stop => f.write_str("Stop"),
        }
    }
}

/// A position feed failure, passed through to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFault {
    /// The platform refused location access.
    PermissionDenied,
    /// The feed failed for another reason.
    Unavailable {
        /// Platform-provided description.
        reason: String,
    },
}

impl std::fmt::Display for SourceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("permission to access location was denied"),
            Self::Unavailable { reason } => write!(f, "location unavailable: {reason}"),
        }
    }
}

/// Emitted once per Armed → Triggered transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Identifies this alert for acknowledgment.
    pub ticket: AlertTicket,
    /// The sample that crossed into the geofence.
    pub position: Position,
    /// Its distance to the destination.
    pub distance_meters: f64,
    /// Alerts fired in this session, including this one.
    pub trigger_count: u32,
    /// Feed that delivered the sample.
    pub source: FeedSource,
}

/// State-change notification for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GeofenceEvent {
    /// Tracking is off or there is no destination.
    Idle,
    /// Watching for the geofence.
    Armed,
    /// An alert fired.
    Triggered(TriggerEvent),
    /// The user snoozed; no re-alert before `rearm_after`.
    Snoozed {
        /// Earliest instant a qualifying sample may re-trigger.
        rearm_after: Timestamp,
    },
    /// Location access must be granted before tracking can work.
    PermissionRequired,
    /// The position feed failed; tracking keeps its logical state.
    SourceError {
        /// What went wrong.
        fault: SourceFault,
    },
}

impl GeofenceEvent {
    /// The state this event reports, if it is a state change.
    pub fn state(&self) -> Option<TriggerState> {
        match self {
            Self::Idle => Some(TriggerState::Idle),
            Self::Armed => Some(TriggerState::Armed),
            Self::Triggered(_) => Some(TriggerState::Triggered),
            Self::Snoozed { .. } => Some(TriggerState::Snoozed),
            Self::PermissionRequired | Self::SourceError { .. } => None,
        }
    }
}

/// Record of a state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: TriggerState,
    /// State after the transition.
    pub to_state: TriggerState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Why it happened.
    pub reason: String,
}
