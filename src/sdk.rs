//! Telemetry widget SDK seam
//!
//! The SDK owns transport and authentication; the session only asks it for
//! history and tears it down.

use crate::Result;

/// Calls the session makes into the widget SDK
pub trait WidgetSdk {
    /// Ask for bulk history between two epoch-millisecond instants
    fn request_histories(&mut self, start_ms: i64, end_ms: i64) -> Result<()>;

    /// Best-effort teardown of the widget session
    fn destroy(&mut self) -> Result<()>;
}

/// SDK stand-in that records the calls it receives
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSdk {
    pub history_requests: Vec<(i64, i64)>,
    pub destroyed: bool,
}

impl RecordingSdk {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WidgetSdk for RecordingSdk {
    fn request_histories(&mut self, start_ms: i64, end_ms: i64) -> Result<()> {
        self.history_requests.push((start_ms, end_ms));
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroyed = true;
        Ok(())
    }
}
