//! # travering-cli — Command-Line Tools for TraveRing
//!
//! Provides the `travering` binary.
//!
//! ## Subcommands
//!
//! - `travering distance`: great-circle distance between two points.
//! - `travering check-config`: load and validate a settings file.
//! - `travering simulate`: replay a recorded track through the geofence
//!   engine and the alert chain, printing a JSON summary.
//!
//! ```bash
//! travering distance 37.0,-122.0 37.01,-122.0
//! travering check-config travering.yaml
//! travering simulate --track commute.yaml --respond snooze
//! ```

pub mod check;
pub mod console;
pub mod distance;
pub mod simulate;
pub mod telemetry;
pub mod track;

use std::path::Path;

use anyhow::{Context, Result};

use travering_core::Settings;

/// Load settings from `path`, or defaults when none is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}
