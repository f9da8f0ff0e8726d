//! # Alarm Session
//!
//! ## States
//!
//! ```text
//!            start_tracking()            inside radius
//!   Idle ───────────────────▶ Armed ───────────────────▶ Triggered
//!    ▲                          ▲                            │
//!    │                          │ cooldown elapsed           │ acknowledge(Snooze)
//!    │                          │                            ▼
//!    │                          └────────────────────── Snoozed
//!    │
//!    └──── stop_tracking() / acknowledge(Stop) from any state
//! ```
//!
//! `set_destination()` resets the session into `Armed` when tracking and
//! `Idle` otherwise, whatever the current state.

use serde::{Deserialize, Serialize};

use travering_core::Timestamp;

/// Lifecycle state of the geofence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerState {
    /// No destination, or tracking disabled.
    Idle,
    /// Tracking with a destination; no alert since the last arm or reset.
    Armed,
    /// An alert fired and is waiting for the user.
    Triggered,
    /// The user deferred the alert; re-arming waits for the cooldown.
    Snoozed,
}

impl TriggerState {
    /// Whether an alert is waiting for acknowledgment.
    pub fn awaiting_ack(&self) -> bool {
        matches!(self, Self::Triggered)
    }
}

impl std::fmt::Display for TriggerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Armed => "ARMED",
            Self::Triggered => "TRIGGERED",
            Self::Snoozed => "SNOOZED",
        };
        f.write_str(s)
    }
}

/// Identifies one alert: the session epoch plus the trigger ordinal.
///
/// Any reset bumps the epoch, so a ticket issued before a stop or a
/// destination change never matches the current session again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertTicket {
    /// Session epoch the alert belongs to.
    pub epoch: u64,
    /// Value of `trigger_count` right after the alert fired.
    pub trigger_count: u32,
}

impl std::fmt::Display for AlertTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alert:{}#{}", self.epoch, self.trigger_count)
    }
}

/// Trigger bookkeeping for the current destination and tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSession {
    pub(crate) state: TriggerState,
    pub(crate) trigger_count: u32,
    pub(crate) last_dismissed_at: Option<Timestamp>,
    pub(crate) trigger_in_flight: bool,
    pub(crate) epoch: u64,
}

impl AlarmSession {
    pub(crate) fn new() -> Self {
        Self {
            state: TriggerState::Idle,
            trigger_count: 0,
            last_dismissed_at: None,
            trigger_in_flight: false,
            epoch: 0,
        }
    }

    /// Forget triggers and cooldown, and start a new epoch.
    pub(crate) fn reset(&mut self) {
        self.trigger_count = 0;
        self.last_dismissed_at = None;
        self.trigger_in_flight = false;
        self.epoch += 1;
    }

    /// Current state.
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Alerts fired since the last reset.
    pub fn trigger_count(&self) -> u32 {
        self.trigger_count
    }

    /// When the user last snoozed, if since the last reset.
    pub fn last_dismissed_at(&self) -> Option<Timestamp> {
        self.last_dismissed_at
    }

    /// Whether an alert is currently being delivered or awaiting the user.
    pub fn trigger_in_flight(&self) -> bool {
        self.trigger_in_flight
    }

    /// Session epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Ticket for the most recent trigger of this session.
    pub fn current_ticket(&self) -> AlertTicket {
        AlertTicket {
            epoch: self.epoch,
            trigger_count: self.trigger_count,
        }
    }
}
