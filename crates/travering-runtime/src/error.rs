use thiserror::Error;

use travering_state::GeofenceError;

/// Errors surfaced through a [`crate::RuntimeHandle`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The consumer task has exited; the command was not applied.
    #[error("geofence runtime has stopped")]
    Stopped,

    /// The state machine rejected the command.
    #[error(transparent)]
    Geofence(#[from] GeofenceError),
}
