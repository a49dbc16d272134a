//! Popup and overlay content
//!
//! Both views are built from a snapshot of the canonical telemetry. They carry
//! the raw numbers for surfaces that render natively and an HTML fragment for
//! web map surfaces.

use serde::Serialize;
use std::fmt::Write as _;

use crate::gradient::{gradient_color, Rgb};
use crate::types::CanonicalTelemetry;

/// Marker popup: colored speed, optional temperature, altitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub speed_kmh: f64,
    pub speed_color: Rgb,
    pub temp: Option<f64>,
    pub alt: f64,
}

impl PopupContent {
    pub fn from_telemetry(telemetry: &CanonicalTelemetry) -> Self {
        Self {
            speed_kmh: telemetry.spd,
            speed_color: gradient_color(telemetry.spd),
            temp: telemetry.temp,
            alt: telemetry.alt,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<b>Speed:</b> <span style="color:{}">{:.1} km/h</span>"#,
            self.speed_color, self.speed_kmh
        );
        if let Some(temp) = self.temp {
            let _ = write!(html, "<br><b>Temp:</b> {temp:.1} °C");
        }
        let _ = write!(html, "<br><b>Alt:</b> {:.1} m", self.alt);
        html
    }
}

/// Collapsible info panel: speed, altitude, temperature, satellites, coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayContent {
    pub speed_kmh: f64,
    pub speed_color: Rgb,
    pub alt: f64,
    pub temp: Option<f64>,
    pub sat: i64,
    pub lat: f64,
    pub lon: f64,
}

impl OverlayContent {
    pub fn from_telemetry(telemetry: &CanonicalTelemetry) -> Self {
        Self {
            speed_kmh: telemetry.spd,
            speed_color: gradient_color(telemetry.spd),
            alt: telemetry.alt,
            temp: telemetry.temp,
            sat: telemetry.sat,
            lat: telemetry.lat,
            lon: telemetry.lon,
        }
    }

    /// Plain text rows, as printed by the CLI
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Speed: {:.1} km/h ({})", self.speed_kmh, self.speed_color),
            format!("Alt: {:.1} m", self.alt),
        ];
        if let Some(temp) = self.temp {
            lines.push(format!("Temp: {temp:.1} °C"));
        }
        lines.push(format!("Sats: {}", self.sat));
        lines.push(format!("Lat/Lon: {:.6}, {:.6}", self.lat, self.lon));
        lines
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div class="speed" style="color:{}">{:.1} km/h</div>"#,
            self.speed_color, self.speed_kmh
        );
        let _ = write!(html, "<div>Alt: {:.1} m</div>", self.alt);
        if let Some(temp) = self.temp {
            let _ = write!(html, "<div>Temp: {temp:.1} °C</div>");
        }
        let _ = write!(html, "<div>Sats: {}</div>", self.sat);
        let _ = write!(
            html,
            r#"<div class="coords">{:.6}, {:.6}</div>"#,
            self.lat, self.lon
        );
        html
    }
}
