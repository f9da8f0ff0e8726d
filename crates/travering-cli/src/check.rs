//! # Check-Config Subcommand
//!
//! Loads a settings file and applies the same rules the engine applies when
//! tracking starts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use travering_core::{format_distance, Settings};

/// Arguments for `travering check-config`.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Settings file (YAML or JSON).
    pub path: PathBuf,
}

/// Load and validate the file at `args.path`.
pub fn check(args: &CheckConfigArgs) -> Result<Settings> {
    let settings = Settings::load(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    settings
        .validate()
        .with_context(|| format!("{} is not usable", args.path.display()))?;
    Ok(settings)
}

pub fn run_check_config(args: &CheckConfigArgs) -> Result<u8> {
    let settings = check(args)?;
    println!(
        "OK: radius {}, cooldown {} ms, poll every {} ms, channel timeout {} ms",
        format_distance(settings.geofence.radius_meters),
        settings.geofence.cooldown_ms,
        settings.feeds.poll_interval_ms,
        settings.alerts.channel_timeout_ms,
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn accepts_valid_settings() {
        let f = file("geofence:\n  radius_meters: 250\n");
        let settings = check(&CheckConfigArgs {
            path: f.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(settings.geofence.radius_meters, 250.0);
    }

    #[test]
    fn rejects_radius_below_minimum() {
        let f = file("geofence:\n  radius_meters: 5\n");
        let err = check(&CheckConfigArgs {
            path: f.path().to_path_buf(),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("not usable"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let f = file("geofence:\n  radius: 250\n");
        assert!(check(&CheckConfigArgs {
            path: f.path().to_path_buf(),
        })
        .is_err());
    }
}
