//! # Geographic Value Types
//!
//! `Coordinates` is the validated latitude/longitude pair shared by
//! [`Position`] (where the device is) and [`Destination`] (where the user
//! wants to be woken up). [`PositionSample`] is the unvalidated shape a
//! position feed actually delivers.
//!
//! ## Invariant
//!
//! Every `Coordinates` value holds a finite latitude in [-90, 90] and a
//! finite longitude in [-180, 180]. Deserialization goes through the same
//! check as [`Coordinates::new`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::temporal::Timestamp;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoreError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// Validate and build a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidCoordinate(format!(
                "latitude must be within [-90, 90], got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidCoordinate(format!(
                "longitude must be within [-180, 180], got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl std::str::FromStr for Coordinates {
    type Err = CoreError;

    /// Parse `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidCoordinate(format!("expected \"lat,lon\", got {s:?}")))?;
        let parse = |part: &str, axis: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| CoreError::InvalidCoordinate(format!("{axis} {part:?}: {e}")))
        };
        Self::new(parse(lat, "latitude")?, parse(lon, "longitude")?)
    }
}

/// Where the device was at a given instant. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Validated location.
    #[serde(flatten)]
    pub coordinates: Coordinates,
    /// When the location was captured.
    pub captured_at: Timestamp,
}

impl Position {
    /// Build a position from raw degrees.
    pub fn new(latitude: f64, longitude: f64, captured_at: Timestamp) -> Result<Self, CoreError> {
        Ok(Self {
            coordinates: Coordinates::new(latitude, longitude)?,
            captured_at,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }
}

/// The point the user wants to be alerted near.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(Coordinates);

impl Destination {
    /// Build a destination from raw degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        Ok(Self(Coordinates::new(latitude, longitude)?))
    }

    /// The validated coordinates.
    pub fn coordinates(&self) -> Coordinates {
        self.0
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.0.latitude()
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.0.longitude()
    }
}

impl From<Coordinates> for Destination {
    fn from(coordinates: Coordinates) -> Self {
        Self(coordinates)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A sample exactly as a position feed delivered it.
///
/// Platform feeds may emit partial data; any field can be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude, if the feed supplied one.
    pub latitude: Option<f64>,
    /// Longitude, if the feed supplied one.
    pub longitude: Option<f64>,
    /// Capture time, if the feed supplied one.
    pub captured_at: Option<Timestamp>,
}

impl PositionSample {
    /// A complete sample.
    pub fn at(latitude: f64, longitude: f64, captured_at: Timestamp) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            captured_at: Some(captured_at),
        }
    }

    /// Validate into a [`Position`], stamping `received_at` when the feed
    /// did not supply a capture time.
    pub fn into_position(self, received_at: Timestamp) -> Result<Position, CoreError> {
        let latitude = self
            .latitude
            .ok_or_else(|| CoreError::InvalidCoordinate("sample has no latitude".into()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| CoreError::InvalidCoordinate("sample has no longitude".into()))?;
        Position::new(latitude, longitude, self.captured_at.unwrap_or(received_at))
    }
}

impl From<Position> for PositionSample {
    fn from(position: Position) -> Self {
        Self::at(position.latitude(), position.longitude(), position.captured_at)
    }
}
