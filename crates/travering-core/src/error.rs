//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! - Coordinate errors name the offending axis and value.
//! - Configuration errors name the field and the rule it broke.

use thiserror::Error;

/// Top-level error type for the core value types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A coordinate was missing, non-finite, or outside its domain.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A geofence configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A timestamp could not be parsed or constructed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Settings could not be deserialized.
    #[error("settings parse error: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A configuration value that violates its validation rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Radius is zero, negative, or not a finite number.
    #[error("radius must be a positive finite number of meters, got {0}")]
    NonPositiveRadius(f64),

    /// Radius is below the minimum accepted by tracking.
    #[error("radius {radius} m is below the minimum of {minimum} m")]
    RadiusBelowMinimum {
        /// The rejected radius.
        radius: f64,
        /// The minimum accepted radius.
        minimum: f64,
    },

    /// An interval or duration setting is zero where a positive value is required.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// The settings field name.
        field: &'static str,
    },

    /// A distance threshold is negative or not finite.
    #[error("{field} must be a non-negative finite number, got {value}")]
    InvalidThreshold {
        /// The settings field name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}
