//! # Great-Circle Distance
//!
//! Haversine distance on a sphere of radius [`EARTH_RADIUS_METERS`]
//! (the WGS-84 equatorial radius). The spherical model is off by up to
//! roughly 0.5% against a true geodesic at destination ranges, which is
//! well inside any sensible alarm radius.
//!
//! ## Numeric Edge Cases
//!
//! - The haversine term `a` can land a hair outside [0, 1] through rounding.
//!   It is clamped before both square roots, so identical points return
//!   exactly `0.0` and antipodal points return `π·R` instead of NaN.
//! - Inputs are validated [`Coordinates`], so every call is total.

use crate::geo::{Coordinates, Destination, Position};

/// Sphere radius used for all distance computations, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Distance in meters from a position to a destination.
pub fn distance(position: &Position, destination: &Destination) -> f64 {
    distance_between(position.coordinates, destination.coordinates())
}

/// Distance in meters between two coordinate pairs.
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let h = (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon).clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Human-readable distance: whole meters below 1 km, otherwise kilometers
/// with one decimal.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Timestamp;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = Position::new(37.0, -122.0, Timestamp::now()).unwrap();
        let d = Destination::new(37.0, -122.0).unwrap();
        assert_eq!(distance(&p, &d), 0.0);
    }

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let d = distance_between(coords(0.0, 0.0), coords(0.0, 180.0));
        assert!((d - PI * EARTH_RADIUS_METERS).abs() < 1e-3, "got {d}");
        let poles = distance_between(coords(90.0, 0.0), coords(-90.0, 0.0));
        assert!((poles - PI * EARTH_RADIUS_METERS).abs() < 1e-3, "got {poles}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // R * π / 180 ≈ 111 319.49 m
        let d = distance_between(coords(0.0, 0.0), coords(1.0, 0.0));
        assert!((d - 111_319.49).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_short_hop_within_half_percent() {
        // ~500 m north of (37, -122); 500 / 111 319.49 degrees.
        let north = 37.0 + 500.0 / 111_319.49;
        let d = distance_between(coords(37.0, -122.0), coords(north, -122.0));
        assert!((d - 500.0).abs() < 2.5, "got {d}");
    }

    #[test]
    fn test_dateline_crossing_is_short() {
        let d = distance_between(coords(0.0, 179.999), coords(0.0, -179.999));
        assert!(d < 250.0, "got {d}");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(499.6), "500 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(12_345.0), "12.3 km");
    }

    fn arb_coords() -> impl Strategy<Value = Coordinates> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| coords(lat, lon))
    }

    proptest! {
        /// A point is always zero meters from itself.
        #[test]
        fn distance_to_self_is_zero(c in arb_coords()) {
            prop_assert_eq!(distance_between(c, c), 0.0);
        }

        /// Distance does not depend on argument order.
        #[test]
        fn distance_is_symmetric(a in arb_coords(), b in arb_coords()) {
            let ab = distance_between(a, b);
            let ba = distance_between(b, a);
            prop_assert!((ab - ba).abs() <= 1e-6 * ab.max(1.0), "{} vs {}", ab, ba);
        }

        /// Distance is finite and bounded by half the circumference.
        #[test]
        fn distance_is_total_and_bounded(a in arb_coords(), b in arb_coords()) {
            let d = distance_between(a, b);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
            prop_assert!(d <= PI * EARTH_RADIUS_METERS + 1e-6);
        }
    }
}
