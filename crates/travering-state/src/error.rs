//! # Geofence Errors
//!
//! Only `start_tracking` can fail. Every other operation either takes
//! effect or is a logged no-op.

use thiserror::Error;

use travering_core::ConfigError;

/// Errors surfaced synchronously by the state machine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeofenceError {
    /// Tracking cannot start with the given radius or without a destination.
    #[error("invalid configuration: {0}")]
    InvalidConfig(ConfigProblem),
}

/// Why a configuration was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigProblem {
    /// The radius failed validation.
    #[error(transparent)]
    Radius(#[from] ConfigError),

    /// No destination has been set.
    #[error("a destination must be set before tracking starts")]
    MissingDestination,
}

impl From<ConfigError> for GeofenceError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(ConfigProblem::Radius(err))
    }
}
