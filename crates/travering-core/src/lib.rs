//! # travering-core — Foundational Types for TraveRing
//!
//! The leaf of the workspace DAG. Defines the value types every other crate
//! exchanges: coordinates, positions and destinations, millisecond UTC
//! timestamps behind an injectable [`Clock`], the haversine distance, the
//! geofence configuration, and the file-backed [`Settings`].
//!
//! ## Key Design Principles
//!
//! 1. **Validated constructors.** A [`Position`] or [`Destination`] can only
//!    be built from finite coordinates inside the latitude/longitude domain,
//!    so the distance function is total over every value it can receive.
//!
//! 2. **Partial data is a separate type.** Feeds deliver [`PositionSample`]s
//!    whose fields may be missing. Turning one into a `Position` is fallible;
//!    the state machine treats the failure as a no-op, not an error.
//!
//! 3. **Time is injected.** Cooldown arithmetic reads time through the
//!    [`Clock`] trait so tests can step a [`ManualClock`] one millisecond at
//!    a time.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `travering-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod distance;
pub mod error;
pub mod geo;
pub mod settings;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use config::{GeofenceConfig, MIN_RADIUS_METERS};
pub use distance::{distance, distance_between, format_distance, EARTH_RADIUS_METERS};
pub use error::{ConfigError, CoreError};
pub use geo::{Coordinates, Destination, Position, PositionSample};
pub use settings::Settings;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
