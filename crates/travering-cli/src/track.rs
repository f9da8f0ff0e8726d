//! # Track Files
//!
//! A recorded trip: the destination plus timed waypoints, in YAML or JSON.
//!
//! ```yaml
//! destination: { latitude: 37.0, longitude: -122.0 }
//! radius_meters: 500        # optional, overrides settings
//! waypoints:
//!   - { at: "2026-03-02T08:00:00Z", latitude: 36.98, longitude: -122.0 }
//!   - { at: "2026-03-02T08:00:05Z", latitude: 36.99, longitude: -122.0, via: push }
//!   - { at: "2026-03-02T08:00:10Z", fault: { kind: permission_denied } }
//! ```
//!
//! A waypoint is delivered by the poll feed, the push feed, or (by
//! default) both. Push deliveries go through the same minimum-movement
//! filter as the live push feed.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use travering_core::{ConfigError, Destination, GeofenceConfig, PositionSample, Settings, Timestamp};
use travering_runtime::{FeedMessage, MovementFilter, ReplayStep};
use travering_state::{FeedSource, SourceFault};

/// Which feed delivers a waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Via {
    Poll,
    Push,
    #[default]
    Both,
}

impl Via {
    fn sources(self) -> &'static [FeedSource] {
        match self {
            Self::Poll => &[FeedSource::Poll],
            Self::Push => &[FeedSource::Push],
            Self::Both => &[FeedSource::Poll, FeedSource::Push],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Waypoint {
    pub at: Timestamp,
    #[serde(default)]
    pub via: Via,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// A feed failure instead of a position.
    #[serde(default)]
    pub fault: Option<SourceFault>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    pub destination: Destination,
    #[serde(default)]
    pub radius_meters: Option<f64>,
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
    pub waypoints: Vec<Waypoint>,
}

impl Track {
    /// Parse a YAML or JSON track and check each waypoint and their ordering.
    pub fn parse(text: &str) -> Result<Self> {
        let track: Track = serde_yaml::from_str(text).context("malformed track")?;
        for waypoint in &track.waypoints {
            if waypoint.fault.is_some()
                && (waypoint.latitude.is_some() || waypoint.longitude.is_some())
            {
                bail!(
                    "waypoint at {} has both a fault and coordinates",
                    waypoint.at
                );
            }
        }
        for pair in track.waypoints.windows(2) {
            if pair[1].at < pair[0].at {
                bail!(
                    "waypoints out of order: {} comes after {}",
                    pair[1].at,
                    pair[0].at
                );
            }
        }
        Ok(track)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read track {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid track {}", path.display()))
    }

    /// When the trip starts; the simulation clock begins here.
    pub fn start(&self) -> Option<Timestamp> {
        self.waypoints.first().map(|w| w.at)
    }

    /// Track overrides layered over `settings`.
    pub fn geofence_config(&self, settings: &Settings) -> Result<GeofenceConfig, ConfigError> {
        GeofenceConfig::new(
            self.radius_meters.unwrap_or(settings.geofence.radius_meters),
            self.cooldown_ms.unwrap_or(settings.geofence.cooldown_ms),
        )
    }

    /// Expand waypoints into per-feed replay steps.
    pub fn steps(&self, push_min_distance_meters: f64) -> Vec<ReplayStep> {
        let mut push_filter = MovementFilter::new(push_min_distance_meters);
        let mut steps = Vec::with_capacity(self.waypoints.len() * 2);

        for waypoint in &self.waypoints {
            let message = match &waypoint.fault {
                Some(fault) => FeedMessage::Fault(fault.clone()),
                None => FeedMessage::Sample(PositionSample {
                    latitude: waypoint.latitude,
                    longitude: waypoint.longitude,
                    captured_at: Some(waypoint.at),
                }),
            };
            for &source in waypoint.via.sources() {
                if let (FeedSource::Push, FeedMessage::Sample(sample)) = (source, &message) {
                    if !push_filter.admit(sample) {
                        continue;
                    }
                }
                steps.push(ReplayStep {
                    at: waypoint.at,
                    source,
                    message: message.clone(),
                });
            }
        }
        steps
    }
}
