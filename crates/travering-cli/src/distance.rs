//! # Distance Subcommand
//!
//! Prints the great-circle distance between two `lat,lon` points.

use anyhow::Result;
use clap::Args;

use travering_core::{distance_between, format_distance, Coordinates};

/// Arguments for `travering distance`.
#[derive(Args, Debug)]
pub struct DistanceArgs {
    /// First point as `lat,lon` in decimal degrees.
    #[arg(allow_hyphen_values = true)]
    pub from: Coordinates,

    /// Second point as `lat,lon` in decimal degrees.
    #[arg(allow_hyphen_values = true)]
    pub to: Coordinates,

    /// Print raw meters instead of a human-readable distance.
    #[arg(long)]
    pub meters: bool,
}

/// Render the answer for `args`.
pub fn describe(args: &DistanceArgs) -> String {
    let meters = distance_between(args.from, args.to);
    if args.meters {
        format!("{meters:.3}")
    } else {
        format_distance(meters)
    }
}

pub fn run_distance(args: &DistanceArgs) -> Result<u8> {
    println!("{}", describe(args));
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(from: &str, to: &str, meters: bool) -> DistanceArgs {
        DistanceArgs {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
            meters,
        }
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(describe(&args("37.0,-122.0", "37.0,-122.0", false)), "0 m");
    }

    #[test]
    fn kilometers_above_a_thousand_meters() {
        assert_eq!(describe(&args("37.0,-122.0", "37.01,-122.0", false)), "1.1 km");
    }

    #[test]
    fn raw_meters() {
        let out = describe(&args("37.0,-122.0", "37.001,-122.0", true));
        let meters: f64 = out.parse().unwrap();
        assert!((meters - 111.3).abs() < 0.5);
    }
}
