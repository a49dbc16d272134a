//! History sample extraction
//!
//! A history response is a list of streams whose samples are either
//! `[timestamp, value]` pairs or objects carrying `value` and `timestamp`.
//! Samples whose value decodes to an object with both `lat` and `lon` become
//! trail points; everything else is skipped without aborting the rest.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::parser::numeric::{parse_float, parse_int};
use crate::parser::payload::looks_like_json_object;
use crate::types::{GeoPoint, HistoriesEvent, HistoryTrail};

/// One raw history sample split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySample<'a> {
    /// Epoch milliseconds, when the sample carries a usable timestamp
    pub timestamp_ms: Option<i64>,
    pub value: &'a Value,
}

impl<'a> HistorySample<'a> {
    /// Split a raw sample; `None` for shapes that carry no value at all
    pub fn from_raw(raw: &'a Value) -> Option<Self> {
        match raw {
            Value::Array(items) if items.len() >= 2 => Some(Self {
                timestamp_ms: parse_timestamp(&items[0]),
                value: &items[1],
            }),
            Value::Object(obj) => obj.get("value").map(|value| Self {
                timestamp_ms: obj.get("timestamp").and_then(parse_timestamp),
                value,
            }),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp_ms.and_then(DateTime::from_timestamp_millis)
    }

    /// Position carried by the sample value, if it has both `lat` and `lon`
    ///
    /// Only the top level of the object is read; history samples carry no
    /// `v` envelope.
    pub fn position(&self) -> Option<GeoPoint> {
        let parsed;
        let fields = match self.value {
            Value::Object(obj) => obj,
            Value::String(text) if looks_like_json_object(self.value) => {
                parsed = serde_json::from_str::<Map<String, Value>>(text).ok()?;
                &parsed
            }
            _ => return None,
        };
        let lat = parse_float(fields.get("lat")?)?;
        let lon = parse_float(fields.get("lon")?)?;
        Some(GeoPoint::new(lat, lon))
    }
}

/// Timestamps come as epoch milliseconds (number or string) or RFC 3339 text
fn parse_timestamp(value: &Value) -> Option<i64> {
    if let Some(text) = value.as_str() {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.timestamp_millis());
        }
    }
    parse_int(value)
}

/// Result of walking a history response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryExtraction {
    pub trail: HistoryTrail,
    pub skipped: usize,
}

/// Collect trail points from every stream, in stream then sample order
pub fn extract_history_trail(event: &HistoriesEvent) -> HistoryExtraction {
    let mut points = Vec::new();
    let mut skipped = 0;

    for (stream_index, stream) in event.streams.iter().enumerate() {
        for raw in &stream.data {
            match HistorySample::from_raw(raw).and_then(|s| s.position()) {
                Some(point) => points.push(point),
                None => {
                    trace!("skipping history sample in stream {stream_index}: {raw}");
                    skipped += 1;
                }
            }
        }
    }

    debug!(
        "history: {} points from {} streams, {} samples skipped",
        points.len(),
        event.streams.len(),
        skipped
    );

    HistoryExtraction {
        trail: HistoryTrail::new(points),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryStream;
    use serde_json::json;

    fn event(streams: Vec<Value>) -> HistoriesEvent {
        HistoriesEvent {
            streams: streams
                .into_iter()
                .map(|data| HistoryStream {
                    data: data.as_array().cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_pairs_skip_malformed() {
        let ev = event(vec![json!([[0, "{\"lat\":1,\"lon\":2}"], [1, "not json"]])]);
        let result = extract_history_trail(&ev);
        assert_eq!(result.trail.points, vec![GeoPoint::new(1.0, 2.0)]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_object_samples_and_multiple_streams() {
        let ev = event(vec![
            json!([{"timestamp": 5, "value": "{\"lat\":\"3.5\",\"lon\":4}"}]),
            json!([
                {"timestamp": 6, "value": "{\"lat\":5}"},
                [7, {"lat": 6, "lon": 7}],
                [8]
            ]),
        ]);
        let result = extract_history_trail(&ev);
        assert_eq!(
            result.trail.points,
            vec![GeoPoint::new(3.5, 4.0), GeoPoint::new(6.0, 7.0)]
        );
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_envelope_key_is_not_unwrapped() {
        let ev = event(vec![json!([
            [0, "{\"lat\":1,\"lon\":2,\"v\":3}"],
            [1, "{\"v\":\"{\\\"lat\\\":5,\\\"lon\\\":6}\"}"]
        ])]);
        let result = extract_history_trail(&ev);
        assert_eq!(result.trail.points, vec![GeoPoint::new(1.0, 2.0)]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_non_object_strings_are_not_positions() {
        let raw = json!([0, "[1,2]"]);
        let sample = HistorySample::from_raw(&raw).unwrap();
        assert_eq!(sample.position(), None);
    }

    #[test]
    fn test_timestamps() {
        let raw = json!(["2024-05-01T10:00:00Z", "{}"]);
        let sample = HistorySample::from_raw(&raw).unwrap();
        assert_eq!(sample.timestamp_ms, Some(1_714_557_600_000));
        assert_eq!(
            sample.timestamp().map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );

        let raw = json!({"value": "{}", "timestamp": "1714557600000"});
        let sample = HistorySample::from_raw(&raw).unwrap();
        assert_eq!(sample.timestamp_ms, Some(1_714_557_600_000));
    }
}
