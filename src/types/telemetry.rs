use serde::{Deserialize, Serialize};

use crate::types::geo::GeoPoint;

/// Value of `button` while the device is recording a trail
pub const BUTTON_RECORDING: i64 = 1;

/// Value stored when a button reading cannot be parsed under the permissive policy
pub const BUTTON_IDLE: i64 = 0;

/// Last known attributes of the tracked device
///
/// Created with zero / `None` defaults and only ever updated field by field:
/// a payload that carries `lat`/`lon` alone leaves `spd`, `alt` etc. at their
/// previous values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalTelemetry {
    /// Latitude in degrees, `0.0` together with `lon == 0.0` means no fix
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Altitude in meters
    pub alt: f64,
    /// Ground speed in km/h
    pub spd: f64,
    /// Satellites in view
    pub sat: i64,
    /// Temperature in degrees, if the device reports one
    pub temp: Option<f64>,
    /// Recording flag, see [`BUTTON_RECORDING`]
    pub button: i64,
}

impl CanonicalTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// No position has been received yet (both coordinates are zero)
    pub fn has_no_fix(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    /// Both coordinates are non-zero, the condition for recentering the map
    pub fn has_full_fix(&self) -> bool {
        self.lat != 0.0 && self.lon != 0.0
    }

    pub fn is_recording(&self) -> bool {
        self.button == BUTTON_RECORDING
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let t = CanonicalTelemetry::new();
        assert!(t.has_no_fix());
        assert!(!t.has_full_fix());
        assert!(!t.is_recording());
        assert_eq!(t.temp, None);
    }

    #[test]
    fn test_fix_predicates_differ_on_single_zero_axis() {
        // one zero axis is neither "no fix" nor a full fix
        let t = CanonicalTelemetry {
            lat: 0.0,
            lon: 12.5,
            ..Default::default()
        };
        assert!(!t.has_no_fix());
        assert!(!t.has_full_fix());
    }
}
