//! # Settings
//!
//! File-backed configuration for a TraveRing deployment, loaded from YAML.
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Unknown keys are rejected to catch typos early.
//!
//! ```yaml
//! geofence:
//!   radius_meters: 500
//!   cooldown_ms: 29000
//! feeds:
//!   poll_interval_ms: 5000
//!   push_min_distance_meters: 5
//! alerts:
//!   channel_timeout_ms: 5000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::GeofenceConfig;
use crate::error::{ConfigError, CoreError};

/// Root settings document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Geofence radius and snooze cooldown.
    pub geofence: GeofenceSettings,
    /// Position feed scheduling.
    pub feeds: FeedSettings,
    /// Alert delivery.
    pub alerts: AlertSettings,
}

/// Geofence radius and snooze cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceSettings {
    /// Alarm radius in meters.
    pub radius_meters: f64,
    /// Minimum time after a snooze before re-alerting.
    pub cooldown_ms: u64,
}

impl Default for GeofenceSettings {
    fn default() -> Self {
        Self {
            radius_meters: 500.0,
            cooldown_ms: 29_000,
        }
    }
}

/// Position feed scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSettings {
    /// Interval of the periodic poll feed.
    pub poll_interval_ms: u64,
    /// Minimum movement before the push feed reports a new sample.
    pub push_min_distance_meters: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            push_min_distance_meters: 5.0,
        }
    }
}

/// Alert delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertSettings {
    /// Title shown on the prompt and system notification.
    pub title: String,
    /// Body shown on the prompt and system notification.
    pub message: String,
    /// Upper bound on each channel attempt.
    pub channel_timeout_ms: u64,
    /// Length of the vibration pulse.
    pub haptic_pulse_ms: u64,
    /// Sound asset played by the audio channels.
    pub sound_asset: String,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            title: "Travering Alarm".to_string(),
            message: "You're near your destination!".to_string(),
            channel_timeout_ms: 5_000,
            haptic_pulse_ms: 2_000,
            sound_asset: "assets/alarm.mp3".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML settings file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// The geofence configuration these settings describe.
    pub fn geofence_config(&self) -> Result<GeofenceConfig, ConfigError> {
        GeofenceConfig::new(self.geofence.radius_meters, self.geofence.cooldown_ms)
    }

    /// Apply the rules the engine and runtime enforce, so a bad file is
    /// reported before anything starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geofence_config()?.check_trackable()?;
        if self.feeds.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "feeds.poll_interval_ms",
            });
        }
        let threshold = self.feeds.push_min_distance_meters;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                field: "feeds.push_min_distance_meters",
                value: threshold,
            });
        }
        if self.alerts.channel_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "alerts.channel_timeout_ms",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let s = Settings::from_yaml_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let s = Settings::from_yaml_str("geofence:\n  radius_meters: 250\n").unwrap();
        assert_eq!(s.geofence.radius_meters, 250.0);
        assert_eq!(s.geofence.cooldown_ms, 29_000);
        assert_eq!(s.feeds.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::from_yaml_str("geofence:\n  radius: 250\n").is_err());
    }

    #[test]
    fn test_validate_rejects_small_radius() {
        let s = Settings::from_yaml_str("geofence:\n  radius_meters: 5\n").unwrap();
        assert!(matches!(
            s.validate(),
            Err(ConfigError::RadiusBelowMinimum { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let s = Settings::from_yaml_str("feeds:\n  poll_interval_ms: 0\n").unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::ZeroDuration { .. })));
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let s = Settings::from_yaml_str("feeds:\n  push_min_distance_meters: -1\n").unwrap();
        assert!(matches!(
            s.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alerts:\n  channel_timeout_ms: 750").unwrap();
        let s = Settings::load(file.path()).unwrap();
        assert_eq!(s.alerts.channel_timeout_ms, 750);
    }
}
