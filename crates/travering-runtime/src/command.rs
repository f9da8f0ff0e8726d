//! Messages into and out of the consumer task.

use serde::Serialize;
use tokio::sync::oneshot;

use travering_core::{Destination, GeofenceConfig};
use travering_notify::DispatchReport;
use travering_state::{AckAction, AlertTicket, GeofenceError, GeofenceEvent};

/// A UI request, applied by the consumer in arrival order with samples.
#[derive(Debug)]
pub enum Command {
    SetDestination(Destination),
    ClearDestination,
    StartTracking {
        config: GeofenceConfig,
        reply: oneshot::Sender<Result<(), GeofenceError>>,
    },
    StopTracking,
    /// The user's answer to the prompt for `ticket`.
    Acknowledge {
        ticket: AlertTicket,
        action: AckAction,
    },
}

/// Published to every subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// A state-machine event, in emission order.
    State { event: GeofenceEvent },
    /// An alert finished dispatching and its prompt should be shown.
    Alert { report: DispatchReport },
}
