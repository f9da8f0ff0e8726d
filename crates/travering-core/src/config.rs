//! # Geofence Configuration
//!
//! The radius/cooldown pair a tracking session runs with. Construction
//! rejects radii the engine cannot evaluate (zero, negative, NaN,
//! infinite). The stricter 10 m floor is applied when tracking starts,
//! through [`GeofenceConfig::check_trackable`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest radius tracking will accept, in meters.
pub const MIN_RADIUS_METERS: f64 = 10.0;

/// Radius and re-alert cooldown for one tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeofenceConfig")]
pub struct GeofenceConfig {
    radius_meters: f64,
    cooldown_ms: u64,
}

#[derive(Deserialize)]
struct RawGeofenceConfig {
    radius_meters: f64,
    #[serde(default)]
    cooldown_ms: u64,
}

impl TryFrom<RawGeofenceConfig> for GeofenceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawGeofenceConfig) -> Result<Self, Self::Error> {
        Self::new(raw.radius_meters, raw.cooldown_ms)
    }
}

impl GeofenceConfig {
    /// Build a configuration. Fails on a non-positive or non-finite radius.
    pub fn new(radius_meters: f64, cooldown_ms: u64) -> Result<Self, ConfigError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(radius_meters));
        }
        Ok(Self {
            radius_meters,
            cooldown_ms,
        })
    }

    /// Alarm radius in meters.
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Minimum time after a snooze before the geofence may fire again.
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    /// Check the rules applied when tracking starts.
    pub fn check_trackable(&self) -> Result<(), ConfigError> {
        if self.radius_meters < MIN_RADIUS_METERS {
            return Err(ConfigError::RadiusBelowMinimum {
                radius: self.radius_meters,
                minimum: MIN_RADIUS_METERS,
            });
        }
        Ok(())
    }
}
