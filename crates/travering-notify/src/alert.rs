//! # Alert and Prompt
//!
//! An [`Alert`] is what the dispatcher delivers for one trigger. The
//! [`AlertPrompt`] it always hands back carries the alert's ticket, so a
//! late answer to a superseded alert is dropped by the state machine rather
//! than acting on the current session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use travering_core::{Timestamp, settings::AlertSettings};
use travering_state::{AckAction, AlertTicket, GeofenceStateMachine, TriggerEvent};

/// One alert occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique per occurrence, for log correlation.
    pub id: Uuid,
    /// The trigger this alert belongs to.
    pub ticket: AlertTicket,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub message: String,
    /// Distance to the destination when the trigger fired.
    pub distance_meters: f64,
    /// When the alert was raised.
    pub raised_at: Timestamp,
}

impl Alert {
    /// Build the alert for a trigger using the configured wording.
    pub fn from_trigger(event: &TriggerEvent, settings: &AlertSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket: event.ticket,
            title: settings.title.clone(),
            message: settings.message.clone(),
            distance_meters: event.distance_meters,
            raised_at: event.position.captured_at,
        }
    }
}

/// The Snooze/Stop choice shown for every alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPrompt {
    /// Alert this prompt answers.
    pub alert_id: Uuid,
    /// Ticket the answer is applied against.
    pub ticket: AlertTicket,
    /// Prompt title.
    pub title: String,
    /// Prompt body.
    pub message: String,
    /// Offered actions, in display order.
    pub actions: Vec<AckAction>,
}

impl AlertPrompt {
    /// The prompt for `alert`.
    pub fn for_alert(alert: &Alert) -> Self {
        Self {
            alert_id: alert.id,
            ticket: alert.ticket,
            title: alert.title.clone(),
            message: alert.message.clone(),
            actions: vec![AckAction::Snooze, AckAction::Stop],
        }
    }

    /// Whether the prompt still answers the machine's current alert.
    pub fn is_current(&self, machine: &GeofenceStateMachine) -> bool {
        machine.is_current(self.ticket)
    }

    /// Apply the user's choice. Returns `false` when the prompt is stale
    /// and nothing changed.
    pub fn respond(&self, machine: &mut GeofenceStateMachine, action: AckAction) -> bool {
        let applied = machine.acknowledge_ticket(self.ticket, action);
        if applied {
            tracing::info!(ticket = %self.ticket, action = ?action, "alert acknowledged");
        } else {
            tracing::debug!(ticket = %self.ticket, action = ?action, "stale prompt answer dropped");
        }
        applied
    }
}
