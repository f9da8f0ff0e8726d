//! # Lockstep Replay
//!
//! Drives a machine and dispatcher over a recorded track, one step at a
//! time, with the clock set to each step's instant. Every alert is fired
//! and, when a response is configured, answered before the next step is
//! applied. The result is deterministic, which the live runtime with its
//! racing feeds is not.

use serde::Serialize;

use travering_core::settings::AlertSettings;
use travering_core::{ManualClock, Timestamp};
use travering_notify::{Alert, DispatchReport, NotificationDispatcher};
use travering_state::{AckAction, FeedSource, GeofenceEvent, GeofenceStateMachine, TriggerState};

use crate::feed::FeedMessage;

/// One recorded input.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    /// Clock reading when the input arrives.
    pub at: Timestamp,
    pub source: FeedSource,
    pub message: FeedMessage,
}

/// What a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Steps applied.
    pub steps: usize,
    /// One report per alert, in firing order.
    pub alerts: Vec<DispatchReport>,
    /// Every state-machine event, in emission order.
    pub events: Vec<GeofenceEvent>,
    pub final_state: TriggerState,
    pub tracking: bool,
    pub last_distance_meters: Option<f64>,
}

/// Replay `steps` against `machine`, whose clock must be `clock`.
///
/// The dispatcher's sound is preloaded before the first step and released
/// after the last.
pub async fn replay(
    machine: &mut GeofenceStateMachine,
    clock: &ManualClock,
    dispatcher: &NotificationDispatcher,
    alerts: &AlertSettings,
    steps: impl IntoIterator<Item = ReplayStep>,
    respond: Option<AckAction>,
) -> ReplaySummary {
    let _ = dispatcher.prepare().await;

    let mut summary = ReplaySummary {
        steps: 0,
        alerts: Vec::new(),
        events: machine.drain_events(),
        final_state: machine.state(),
        tracking: machine.is_tracking(),
        last_distance_meters: None,
    };

    for step in steps {
        clock.set(step.at);
        summary.steps += 1;
        match step.message {
            FeedMessage::Sample(sample) => {
                if let Some(trigger) = machine.on_position(sample, step.source) {
                    let report = dispatcher.fire(Alert::from_trigger(&trigger, alerts)).await;
                    if let Some(action) = respond {
                        report.prompt.respond(machine, action);
                    }
                    summary.alerts.push(report);
                }
            }
            FeedMessage::Fault(fault) => machine.report_source_error(fault),
        }
        summary.events.extend(machine.drain_events());
    }

    dispatcher.shutdown().await;
    summary.final_state = machine.state();
    summary.tracking = machine.is_tracking();
    summary.last_distance_meters = machine.distance_meters();
    tracing::info!(
        steps = summary.steps,
        alerts = summary.alerts.len(),
        final_state = %summary.final_state,
        "replay finished"
    );
    summary
}
