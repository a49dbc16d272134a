//! A session, its presentation driver and the surface they draw on

use tracing::debug;

use crate::config::TrackerConfig;
use crate::driver::{PresentationDriver, TickOutcome};
use crate::sdk::WidgetSdk;
use crate::session::TelemetrySession;
use crate::surface::MapSurface;
use crate::types::WidgetEvent;

/// Single owner of all mutable state of a mounted map view
///
/// Events and ticks are applied one at a time through `&mut self`, so the
/// telemetry record is never observed half-updated.
pub struct LiveSession<S: WidgetSdk, M: MapSurface> {
    pub session: TelemetrySession<S>,
    pub driver: PresentationDriver,
    pub surface: M,
}

impl<S: WidgetSdk, M: MapSurface> LiveSession<S, M> {
    pub fn new(sdk: S, surface: M, config: &TrackerConfig) -> Self {
        Self {
            session: TelemetrySession::new(sdk, config),
            driver: PresentationDriver::new(),
            surface,
        }
    }

    pub fn handle(&mut self, event: &WidgetEvent) {
        debug!("handling {} event", event.kind());
        self.session.dispatch(event, &mut self.surface);
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.driver.tick(self.session.telemetry(), &mut self.surface)
    }

    /// Tear down trail, history and the widget session
    pub fn shutdown(&mut self) {
        self.driver.end_recording(&mut self.surface);
        self.session.shutdown(&mut self.surface);
    }
}
