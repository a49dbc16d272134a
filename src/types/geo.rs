use serde::{Deserialize, Serialize};

use crate::gradient::Rgb;

/// A `(lat, lon)` pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Continuous, color-homogeneous polyline drawn while recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailSegment {
    pub color: Rgb,
    pub points: Vec<GeoPoint>,
}

impl TrailSegment {
    /// Start a segment, optionally seeded with the previous segment's last point
    pub fn new(color: Rgb, anchor: Option<GeoPoint>) -> Self {
        Self {
            color,
            points: anchor.into_iter().collect(),
        }
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.points.push(point);
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Static trail reconstructed from one bulk history response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTrail {
    pub points: Vec<GeoPoint>,
}

impl HistoryTrail {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
