//! Telemetry session controller
//!
//! Owns the canonical telemetry record and bridges the three widget
//! callbacks (configuration, values, histories) to the normalizer and the
//! map surface. Every handler error stops at [`TelemetrySession::dispatch`]:
//! it is logged and the session carries on.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::parser::{
    extract_history_trail, looks_like_json_object, parse_int, Normalizer, NumericPolicy,
};
use crate::render::OverlayContent;
use crate::sdk::WidgetSdk;
use crate::surface::{MapSurface, PolylineId, PolylineStyle};
use crate::types::{
    CanonicalTelemetry, ConfigurationEvent, HistoriesEvent, HistoryTrail, ValuesEvent, WidgetEvent,
    BUTTON_IDLE,
};
use crate::Result;

/// Event counters, reported by the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub configurations: usize,
    pub values: usize,
    pub histories: usize,
    pub failed_events: usize,
}

pub struct TelemetrySession<S: WidgetSdk> {
    sdk: S,
    normalizer: Normalizer,
    telemetry: CanonicalTelemetry,
    /// First declared realtime channel: JSON telemetry blob
    telemetry_channel: Option<String>,
    /// Second declared realtime channel: recording button
    button_channel: Option<String>,
    history_window: TimeDelta,
    history_requested: bool,
    history: HistoryTrail,
    history_line: Option<PolylineId>,
    stats: SessionStats,
}

impl<S: WidgetSdk> TelemetrySession<S> {
    pub fn new(sdk: S, config: &TrackerConfig) -> Self {
        Self {
            sdk,
            normalizer: Normalizer::new(config.numeric_policy),
            telemetry: CanonicalTelemetry::new(),
            telemetry_channel: None,
            button_channel: None,
            history_window: config.history_window(),
            history_requested: false,
            history: HistoryTrail::default(),
            history_line: None,
            stats: SessionStats::default(),
        }
    }

    /// Handle one widget event, logging and swallowing any failure
    pub fn dispatch<M: MapSurface + ?Sized>(&mut self, event: &WidgetEvent, surface: &mut M) {
        self.dispatch_at(event, surface, Utc::now());
    }

    /// [`dispatch`](Self::dispatch) with an explicit clock for the history window
    pub fn dispatch_at<M: MapSurface + ?Sized>(
        &mut self,
        event: &WidgetEvent,
        surface: &mut M,
        now: DateTime<Utc>,
    ) {
        let result = match event {
            WidgetEvent::Configuration(config) => {
                self.stats.configurations += 1;
                self.on_configuration(config, now)
            }
            WidgetEvent::Values(values) => {
                self.stats.values += 1;
                self.on_values(values, surface)
            }
            WidgetEvent::Histories(histories) => {
                self.stats.histories += 1;
                self.on_histories(histories, surface)
            }
        };

        if let Err(e) = result {
            self.stats.failed_events += 1;
            error!("{} event failed: {e}", event.kind());
        }
    }

    /// Record channel roles and request the history window once
    pub fn on_configuration(
        &mut self,
        config: &ConfigurationEvent,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.telemetry_channel = config.realtime.first().map(|c| c.id.clone());
        self.button_channel = config.realtime.get(1).map(|c| c.id.clone());

        info!(
            "configuration: telemetry channel {:?}, button channel {:?}",
            self.telemetry_channel, self.button_channel
        );
        if config.realtime.len() < 2 {
            warn!(
                "configuration declares {} realtime channels, expected 2",
                config.realtime.len()
            );
        }

        if self.history_requested {
            debug!("history already requested, not requesting again");
            return Ok(());
        }
        self.history_requested = true;

        let end_ms = now.timestamp_millis();
        let start_ms = (now - self.history_window).timestamp_millis();
        debug!("requesting history {start_ms}..{end_ms}");
        self.sdk.request_histories(start_ms, end_ms)
    }

    /// Resolve button and telemetry values, then refresh the overlay
    pub fn on_values<M: MapSurface + ?Sized>(
        &mut self,
        event: &ValuesEvent,
        surface: &mut M,
    ) -> Result<()> {
        let values = &event.values;
        if values.is_empty() {
            debug!("values event without channels");
        }

        if let Some(envelope) = self.button_channel.as_deref().and_then(|id| values.get(id)) {
            match (parse_int(&envelope.value), self.normalizer.policy) {
                (Some(button), _) => self.telemetry.button = button,
                (None, NumericPolicy::Permissive) => {
                    warn!("non-numeric button value {}, recording off", envelope.value);
                    self.telemetry.button = BUTTON_IDLE;
                }
                (None, NumericPolicy::Strict) => {
                    warn!("ignoring non-numeric button value {}", envelope.value)
                }
            }
        }

        match self.telemetry_channel.as_deref().and_then(|id| values.get(id)) {
            Some(envelope) => {
                self.normalizer.normalize(&envelope.value, &mut self.telemetry);
            }
            None => {
                // no known telemetry channel in this event: try every JSON-looking value
                for (id, envelope) in values.iter() {
                    if looks_like_json_object(&envelope.value) {
                        debug!("normalizing JSON-looking value of channel {id}");
                        self.normalizer.normalize(&envelope.value, &mut self.telemetry);
                    }
                }
            }
        }

        surface.update_overlay(&OverlayContent::from_telemetry(&self.telemetry));
        if self.telemetry.has_full_fix() {
            surface.pan_to(self.telemetry.position());
        }
        Ok(())
    }

    /// Replace the drawn history trail with the one in `event`
    pub fn on_histories<M: MapSurface + ?Sized>(
        &mut self,
        event: &HistoriesEvent,
        surface: &mut M,
    ) -> Result<()> {
        let extraction = extract_history_trail(event);

        if let Some(id) = self.history_line.take() {
            surface.remove_polyline(id);
        }

        if extraction.trail.is_empty() {
            info!(
                "history contained no positions ({} samples skipped)",
                extraction.skipped
            );
            self.history = HistoryTrail::default();
            return Ok(());
        }

        info!(
            "drawing history trail with {} points ({} samples skipped)",
            extraction.trail.len(),
            extraction.skipped
        );
        self.history_line =
            Some(surface.draw_polyline(&extraction.trail.points, PolylineStyle::history()));
        self.history = extraction.trail;
        Ok(())
    }

    /// Destroy the widget session and remove the history trail
    pub fn shutdown<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        if let Err(e) = self.sdk.destroy() {
            warn!("widget teardown failed: {e}");
        }
        if let Some(id) = self.history_line.take() {
            surface.remove_polyline(id);
        }
    }

    pub fn telemetry(&self) -> &CanonicalTelemetry {
        &self.telemetry
    }

    pub fn history(&self) -> &HistoryTrail {
        &self.history
    }

    pub fn telemetry_channel(&self) -> Option<&str> {
        self.telemetry_channel.as_deref()
    }

    pub fn button_channel(&self) -> Option<&str> {
        self.button_channel.as_deref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::RecordingSdk;
    use crate::surface::{MapCommand, RecordingSurface};
    use crate::types::{ChannelDescriptor, ChannelValues, GeoPoint, HistoryStream};
    use chrono::TimeZone;
    use serde_json::json;

    fn session() -> TelemetrySession<RecordingSdk> {
        TelemetrySession::new(RecordingSdk::new(), &TrackerConfig::default())
    }

    fn configure(session: &mut TelemetrySession<RecordingSdk>, surface: &mut RecordingSurface) {
        let event = WidgetEvent::Configuration(ConfigurationEvent {
            realtime: vec![ChannelDescriptor::new("json"), ChannelDescriptor::new("btn")],
        });
        session.dispatch(&event, surface);
    }

    fn values(entries: &[(&str, serde_json::Value)]) -> WidgetEvent {
        let mut values = ChannelValues::new();
        for (id, value) in entries {
            values.insert(*id, value.clone());
        }
        WidgetEvent::Values(ValuesEvent { values })
    }

    #[test]
    fn test_configuration_requests_history_once() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = WidgetEvent::Configuration(ConfigurationEvent {
            realtime: vec![ChannelDescriptor::new("json"), ChannelDescriptor::new("btn")],
        });

        s.dispatch_at(&event, &mut surface, now);
        s.dispatch_at(&event, &mut surface, now);

        assert_eq!(s.telemetry_channel(), Some("json"));
        assert_eq!(s.button_channel(), Some("btn"));
        let end = now.timestamp_millis();
        assert_eq!(s.sdk().history_requests, vec![(end - 24 * 3_600_000, end)]);
    }

    #[test]
    fn test_values_before_configuration_use_scan() {
        let mut s = session();
        let mut surface = RecordingSurface::new();

        s.dispatch(
            &values(&[
                ("a", json!("{\"lat\": 1, \"spd\": 5}")),
                ("b", json!("plain")),
                ("c", json!(" {\"lat\": 2, \"lon\": 3}")),
            ]),
            &mut surface,
        );

        // last candidate wins for lat, earlier fields survive
        assert_eq!(s.telemetry().lat, 2.0);
        assert_eq!(s.telemetry().lon, 3.0);
        assert_eq!(s.telemetry().spd, 5.0);
        assert_eq!(surface.center, Some(GeoPoint::new(2.0, 3.0)));
    }

    #[test]
    fn test_values_with_known_channels() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        configure(&mut s, &mut surface);

        s.dispatch(
            &values(&[
                ("btn", json!("1")),
                ("json", json!({"v": "{\"lat\":45.5,\"lon\":16.5,\"sat\":\"8\"}"})),
                ("other", json!("{\"lat\": 99, \"lon\": 99}")),
            ]),
            &mut surface,
        );

        let t = s.telemetry();
        assert_eq!(t.button, 1);
        assert_eq!((t.lat, t.lon, t.sat), (45.5, 16.5, 8));
        assert_eq!(surface.overlay.as_ref().unwrap().sat, 8);
    }

    #[test]
    fn test_button_only_update_keeps_position() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        configure(&mut s, &mut surface);
        s.dispatch(&values(&[("json", json!("{\"lat\":1,\"lon\":2}"))]), &mut surface);
        s.dispatch(&values(&[("btn", json!(1))]), &mut surface);

        assert_eq!(s.telemetry().button, 1);
        assert_eq!(s.telemetry().position(), GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_no_recenter_without_full_fix() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        configure(&mut s, &mut surface);
        s.dispatch(&values(&[("json", json!("{\"lat\":1}"))]), &mut surface);

        assert!(surface.overlay.is_some());
        assert_eq!(surface.center, None);
    }

    #[test]
    fn test_empty_values_event_refreshes_overlay() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        s.dispatch(&values(&[]), &mut surface);
        assert_eq!(s.stats().failed_events, 0);
        assert_eq!(s.stats().values, 1);
        assert_eq!(surface.overlay, Some(OverlayContent::from_telemetry(s.telemetry())));
    }

    #[test]
    fn test_unparseable_button_follows_policy() {
        let config = TrackerConfig {
            numeric_policy: NumericPolicy::Permissive,
            ..TrackerConfig::default()
        };
        let mut permissive = TelemetrySession::new(RecordingSdk::new(), &config);
        let mut strict = session();
        let mut surface = RecordingSurface::new();

        for s in [&mut permissive, &mut strict] {
            configure(s, &mut surface);
            s.dispatch(&values(&[("btn", json!(1))]), &mut surface);
            s.dispatch(&values(&[("btn", json!(false))]), &mut surface);
            s.dispatch(&values(&[("btn", json!("off"))]), &mut surface);
        }

        assert!(!permissive.telemetry().is_recording());
        assert!(strict.telemetry().is_recording());
    }

    #[test]
    fn test_histories_replace_previous_trail() {
        let mut s = session();
        let mut surface = RecordingSurface::new();

        let first = WidgetEvent::Histories(HistoriesEvent {
            streams: vec![HistoryStream {
                data: vec![json!([0, "{\"lat\":1,\"lon\":2}"]), json!([1, "not json"])],
            }],
        });
        s.dispatch(&first, &mut surface);
        assert_eq!(s.history().points, vec![GeoPoint::new(1.0, 2.0)]);
        assert_eq!(surface.polylines().len(), 1);

        let second = WidgetEvent::Histories(HistoriesEvent {
            streams: vec![HistoryStream {
                data: vec![json!([2, "{\"lat\":3,\"lon\":4}"]), json!([3, "{\"lat\":5,\"lon\":6}"])],
            }],
        });
        s.dispatch(&second, &mut surface);
        assert_eq!(surface.polylines().len(), 1);
        assert_eq!(surface.polylines()[0].points.len(), 2);

        let empty = WidgetEvent::Histories(HistoriesEvent::default());
        s.dispatch(&empty, &mut surface);
        assert!(surface.polylines().is_empty());
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_shutdown_destroys_sdk_and_history() {
        let mut s = session();
        let mut surface = RecordingSurface::new();
        let event = WidgetEvent::Histories(HistoriesEvent {
            streams: vec![HistoryStream {
                data: vec![json!([0, "{\"lat\":1,\"lon\":2}"])],
            }],
        });
        s.dispatch(&event, &mut surface);
        s.shutdown(&mut surface);

        assert!(s.sdk().destroyed);
        assert!(surface.polylines().is_empty());
        assert!(matches!(
            surface.commands.last(),
            Some(MapCommand::RemovePolyline { .. })
        ));
    }
}
