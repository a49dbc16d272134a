//! Session configuration
//!
//! Defaults are hard-coded; every value can be overridden through a
//! `LIVE_TRACKER_*` environment variable and then by CLI flags.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::error::TrackerError;
use crate::parser::NumericPolicy;
use crate::types::GeoPoint;
use crate::Result;

pub const ENV_PREFIX: &str = "LIVE_TRACKER_";

/// One year
const MAX_HISTORY_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Map center before the first fix
    pub initial_center: GeoPoint,
    pub initial_zoom: u8,
    /// Tile source template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub tile_url: String,
    /// Presentation tick
    pub tick_interval_ms: u64,
    /// Span of the bulk history request issued on configuration
    pub history_window_hours: i64,
    pub numeric_policy: NumericPolicy,
    /// Bound of the widget event channel
    pub event_channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            initial_center: GeoPoint::new(45.81298654949797, 15.977990737614029),
            initial_zoom: 13,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tick_interval_ms: 1000,
            history_window_hours: 24,
            numeric_policy: NumericPolicy::Strict,
            event_channel_capacity: 64,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `LIVE_TRACKER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `LIVE_TRACKER_*` keys
    ///
    /// Values that do not parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = parse_var(&get, "CENTER_LAT") {
            config.initial_center.lat = v;
        }
        if let Some(v) = parse_var(&get, "CENTER_LON") {
            config.initial_center.lon = v;
        }
        if let Some(v) = parse_var(&get, "ZOOM") {
            config.initial_zoom = v;
        }
        if let Some(v) = get("TILE_URL") {
            config.tile_url = v;
        }
        if let Some(v) = parse_var(&get, "TICK_MS") {
            config.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&get, "HISTORY_HOURS") {
            config.history_window_hours = v;
        }
        if let Some(v) = parse_var(&get, "NUMERIC_POLICY") {
            config.numeric_policy = v;
        }
        if let Some(v) = parse_var(&get, "CHANNEL_CAPACITY") {
            config.event_channel_capacity = v;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(TrackerError::Config("tick interval must be positive".into()));
        }
        if !(1..=MAX_HISTORY_HOURS).contains(&self.history_window_hours) {
            return Err(TrackerError::Config(format!(
                "history window must be 1..={MAX_HISTORY_HOURS}h, got {}h",
                self.history_window_hours
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(TrackerError::Config("event channel capacity must be positive".into()));
        }
        if self.initial_zoom > 22 {
            return Err(TrackerError::Config(format!(
                "zoom {} out of range 0..=22",
                self.initial_zoom
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// History span, clamped to the range [`validate`](Self::validate) accepts
    pub fn history_window(&self) -> TimeDelta {
        TimeDelta::hours(self.history_window_hours.clamp(1, MAX_HISTORY_HOURS))
    }
}

fn parse_var<T, G>(get: &G, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("ignoring {ENV_PREFIX}{name}={raw:?}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.history_window(), TimeDelta::hours(24));
    }

    #[test]
    fn test_env_overrides() {
        let config = TrackerConfig::from_lookup(lookup(&[
            ("LIVE_TRACKER_CENTER_LAT", "52.52"),
            ("LIVE_TRACKER_TICK_MS", "250"),
            ("LIVE_TRACKER_NUMERIC_POLICY", "permissive"),
            ("LIVE_TRACKER_TILE_URL", "https://tiles.example/{z}/{x}/{y}.png"),
        ]));
        assert_eq!(config.initial_center.lat, 52.52);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.numeric_policy, NumericPolicy::Permissive);
        assert_eq!(config.tile_url, "https://tiles.example/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let config = TrackerConfig::from_lookup(lookup(&[
            ("LIVE_TRACKER_ZOOM", "close"),
            ("LIVE_TRACKER_HISTORY_HOURS", "-"),
        ]));
        assert_eq!(config.initial_zoom, 13);
        assert_eq!(config.history_window_hours, 24);
    }

    #[test]
    fn test_validate_rejects_zero_tick() {
        let config = TrackerConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"history_window_hours": 6, "numeric_policy": "permissive"}"#)
                .unwrap();
        assert_eq!(config.history_window_hours, 6);
        assert_eq!(config.numeric_policy, NumericPolicy::Permissive);
        assert_eq!(config.tick_interval_ms, 1000);
    }
}
