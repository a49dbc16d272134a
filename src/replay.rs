//! Offline replay of recorded widget sessions
//!
//! An event log is a JSON-lines file: one widget event per line in the same
//! shape the widget delivers it, tagged with `type`, plus `{"type":"tick"}`
//! lines standing in for the presentation timer. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! {"type":"configuration","realtime":[{"id":"json"},{"id":"btn"}]}
//! {"type":"values","values":{"json":{"value":"{\"lat\":45.8,\"lon\":15.9}"},"btn":{"value":1}}}
//! {"type":"tick"}
//! {"type":"histories","streams":[{"data":[[0,"{\"lat\":45.7,\"lon\":15.8}"]]}]}
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::driver::PresentationDriver;
use crate::error::TrackerError;
use crate::live::LiveSession;
use crate::sdk::RecordingSdk;
use crate::session::SessionStats;
use crate::surface::RecordingSurface;
use crate::types::{CanonicalTelemetry, HistoryTrail, TrailSegment, WidgetEvent};
use crate::Result;

/// One line of an event log
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayRecord {
    Event(WidgetEvent),
    /// Run the presentation tick this many times
    Tick(u32),
}

#[derive(Debug, Deserialize)]
struct TickLine {
    #[serde(default = "one")]
    count: u32,
}

fn one() -> u32 {
    1
}

impl ReplayRecord {
    pub fn parse_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;
        match value.get("type").and_then(Value::as_str) {
            Some("tick") => {
                let tick: TickLine = serde_json::from_value(value)?;
                Ok(ReplayRecord::Tick(tick.count))
            }
            Some(_) => Ok(ReplayRecord::Event(serde_json::from_value(value)?)),
            None => Err(TrackerError::Event("record has no \"type\" field".into())),
        }
    }
}

/// Parsed event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub records: Vec<ReplayRecord>,
    /// 1-based numbers of lines that could not be parsed
    pub skipped_lines: Vec<usize>,
}

/// Parse JSON-lines text, skipping (and logging) malformed lines
pub fn parse_event_log(text: &str) -> EventLog {
    let mut log = EventLog::default();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match ReplayRecord::parse_line(trimmed) {
            Ok(record) => log.records.push(record),
            Err(e) => {
                let err = TrackerError::Replay {
                    line: line_number,
                    message: e.to_string(),
                };
                warn!("skipping event log line: {err}");
                log.skipped_lines.push(line_number);
            }
        }
    }

    debug!(
        "event log: {} records, {} lines skipped",
        log.records.len(),
        log.skipped_lines.len()
    );
    log
}

pub fn read_event_log(path: &Path) -> Result<EventLog> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_event_log(&text))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Run one tick after every values event, for logs without tick lines
    pub auto_tick: bool,
}

/// State left behind by a replay
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub telemetry: CanonicalTelemetry,
    pub history: HistoryTrail,
    /// Every trail segment drawn during the replay, oldest first
    pub segments: Vec<TrailSegment>,
    pub ticks: u64,
    pub map_commands: usize,
    pub stats: SessionStats,
}

/// Replay records against an in-memory surface
pub fn replay(records: &[ReplayRecord], config: &TrackerConfig, options: ReplayOptions) -> ReplayOutcome {
    let mut live = LiveSession::new(RecordingSdk::new(), RecordingSurface::new(), config);
    // exports need every recording, not just the last one
    live.driver = PresentationDriver::keeping_finished();

    for record in records {
        match record {
            ReplayRecord::Event(event) => {
                live.handle(event);
                if options.auto_tick && matches!(event, WidgetEvent::Values(_)) {
                    live.tick();
                }
            }
            ReplayRecord::Tick(count) => {
                for _ in 0..*count {
                    live.tick();
                }
            }
        }
    }

    // segments are collected before shutdown tears the live trail down
    let segments = live.driver.all_segments();
    let outcome_telemetry = live.session.telemetry().clone();
    let history = live.session.history().clone();
    live.shutdown();

    ReplayOutcome {
        telemetry: outcome_telemetry,
        history,
        segments,
        ticks: live.driver.tick_count(),
        map_commands: live.surface.commands.len(),
        stats: live.session.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    const LOG: &str = r#"
# recorded session
{"type":"configuration","realtime":[{"id":"json"},{"id":"btn"}]}
{"type":"values","values":{"json":{"value":"{\"lat\":1,\"lon\":1,\"spd\":0}"},"btn":{"value":"1"}}}
{"type":"tick"}
{"type":"values","values":{"json":{"value":"{\"lat\":1.1,\"lon\":1.1}"}}}
{"type":"tick"}
this is not json
{"type":"values","values":{"json":{"value":"{\"lat\":1.2,\"lon\":1.2,\"spd\":150}"}}}
{"type":"tick","count":2}
{"kind":"values"}
{"type":"histories","streams":[{"data":[[0,"{\"lat\":0.5,\"lon\":0.5}"],[1,"not json"]]}]}
"#;

    #[test]
    fn test_parse_skips_bad_lines() {
        let log = parse_event_log(LOG);
        assert_eq!(log.records.len(), 8);
        assert_eq!(log.skipped_lines, vec![8, 11]);
        assert_eq!(log.records[6], ReplayRecord::Tick(2));
    }

    #[test]
    fn test_replay_builds_segments() {
        let log = parse_event_log(LOG);
        let outcome = replay(&log.records, &TrackerConfig::default(), ReplayOptions::default());

        assert_eq!(outcome.ticks, 4);
        assert_eq!(outcome.telemetry.position(), GeoPoint::new(1.2, 1.2));
        assert_eq!(outcome.history.points, vec![GeoPoint::new(0.5, 0.5)]);
        assert_eq!(outcome.segments.len(), 2);
        assert_eq!(outcome.segments[1].first(), outcome.segments[0].last());
        assert_eq!(outcome.stats.values, 3);
    }

    #[test]
    fn test_auto_tick() {
        let log = parse_event_log(
            r#"{"type":"values","values":{"a":{"value":"{\"lat\":3,\"lon\":4}"}}}"#,
        );
        let outcome = replay(
            &log.records,
            &TrackerConfig::default(),
            ReplayOptions { auto_tick: true },
        );
        assert_eq!(outcome.ticks, 1);
        assert!(outcome.map_commands > 0);
    }
}
