//! Speed to color mapping
//!
//! Speeds are mapped onto a fixed set of calibration stops and linearly
//! interpolated per RGB channel. Used for the popup/overlay speed text and as
//! the key for trail re-segmentation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form used by GPX/GeoJSON exports
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// CSS functional notation, e.g. `rgb(255,82,0)`
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Calibration point: speed in km/h and the color it maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub speed: f64,
    pub color: Rgb,
}

/// Stops in ascending speed order
pub const GRADIENT_STOPS: [GradientStop; 5] = [
    GradientStop {
        speed: 0.0,
        color: Rgb::new(0, 0, 255), // blue
    },
    GradientStop {
        speed: 40.0,
        color: Rgb::new(0, 255, 0), // green
    },
    GradientStop {
        speed: 70.0,
        color: Rgb::new(255, 165, 0), // orange
    },
    GradientStop {
        speed: 100.0,
        color: Rgb::new(255, 0, 0), // red
    },
    GradientStop {
        speed: 120.0,
        color: Rgb::new(148, 0, 211), // violet
    },
];

/// Map a speed in km/h to its gradient color
///
/// Speeds at or below the first stop clamp to blue, at or above the last stop
/// to violet. A speed exactly on an inner stop resolves against the lower
/// bracket, which yields the stop color itself.
pub fn gradient_color(speed: f64) -> Rgb {
    let first = GRADIENT_STOPS[0];
    let last = GRADIENT_STOPS[GRADIENT_STOPS.len() - 1];

    if speed <= first.speed {
        return first.color;
    }
    if speed >= last.speed {
        return last.color;
    }

    for pair in GRADIENT_STOPS.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start.speed <= speed && speed <= end.speed {
            let factor = (speed - start.speed) / (end.speed - start.speed);
            return Rgb::new(
                lerp_channel(start.color.r, end.color.r, factor),
                lerp_channel(start.color.g, end.color.g, factor),
                lerp_channel(start.color.b, end.color.b, factor),
            );
        }
    }

    // only NaN gets here
    first.color
}

/// Interpolate one channel; ties round to even so 82.5 becomes 82
fn lerp_channel(start: u8, end: u8, factor: f64) -> u8 {
    let value = start as f64 + (end as f64 - start as f64) * factor;
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
