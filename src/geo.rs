use serde::{Deserialize, Serialize};

pub const MILES_PER_METER: f64 = 0.000_621_371;

/// Geographic point in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Coordinate key rounded to 5 decimal places (~1 m resolution).
    #[must_use]
    pub fn rounded_key(self) -> String {
        format!("{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Key identifying an (origin, destination) pair at 5-decimal precision.
#[must_use]
pub fn route_pair_key(origin: LatLng, destination: LatLng) -> String {
    format!("{}|{}", origin.rounded_key(), destination.rounded_key())
}

/// Meters to miles, rounded to one decimal. Non-finite or non-positive
/// input yields 0.
#[must_use]
pub fn meters_to_miles(meters: f64) -> f64 {
    if !meters.is_finite() || meters <= 0.0 {
        return 0.0;
    }
    (meters * MILES_PER_METER * 10.0).round() / 10.0
}

/// Seconds to whole minutes, rounded. Non-finite or non-positive input
/// yields 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn seconds_to_minutes(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds / 60.0).round() as u32
}

/// Human-readable coordinate, e.g. `40.7128° N`.
#[must_use]
pub fn format_coordinate(value: f64, is_latitude: bool) -> String {
    let direction = if is_latitude {
        if value >= 0.0 {
            "N"
        } else {
            "S"
        }
    } else if value >= 0.0 {
        "E"
    } else {
        "W"
    };
    format!("{:.4}\u{b0} {direction}", value.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meters_to_miles_rounds_to_one_decimal() {
        assert!((meters_to_miles(5000.0) - 3.1).abs() < f64::EPSILON);
        assert!((meters_to_miles(1609.34) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn converters_guard_degenerate_input() {
        assert!(meters_to_miles(f64::NAN).abs() < f64::EPSILON);
        assert!(meters_to_miles(-12.0).abs() < f64::EPSILON);
        assert_eq!(seconds_to_minutes(f64::NAN), 0);
        assert_eq!(seconds_to_minutes(-60.0), 0);
        assert_eq!(seconds_to_minutes(0.0), 0);
    }

    #[test]
    fn seconds_to_minutes_rounds() {
        assert_eq!(seconds_to_minutes(600.0), 10);
        assert_eq!(seconds_to_minutes(89.0), 1);
        assert_eq!(seconds_to_minutes(91.0), 2);
    }

    #[test]
    fn coordinate_formatting_uses_hemisphere_letters() {
        assert_eq!(format_coordinate(40.7128, true), "40.7128\u{b0} N");
        assert_eq!(format_coordinate(-74.006, false), "74.0060\u{b0} W");
    }

    #[test]
    fn pair_key_rounds_to_five_decimals() {
        let a = route_pair_key(LatLng::new(40.712_801, -74.006_002), LatLng::new(40.72, -73.99));
        let b = route_pair_key(LatLng::new(40.712_799, -74.005_998), LatLng::new(40.72, -73.99));
        assert_eq!(a, b);
    }

    #[test]
    fn validity_bounds() {
        assert!(LatLng::new(40.7, -74.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, 181.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }
}
