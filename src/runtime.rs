//! Async event loop for a live session
//!
//! Widget callbacks are forwarded into a bounded channel; the loop is the
//! only consumer and interleaves them with the presentation tick. Closing
//! the channel or cancelling the token ends the loop and tears the session
//! down.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::live::LiveSession;
use crate::sdk::WidgetSdk;
use crate::surface::MapSurface;
use crate::types::WidgetEvent;
use crate::Result;

/// Producer side of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<WidgetEvent>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// Forward a widget callback to the session loop
    pub async fn send(&self, event: WidgetEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|e| TrackerError::Event(format!("session loop is gone, dropped {}", e.0.kind())))
    }

    /// Non-blocking variant for callback contexts that cannot await
    pub fn try_send(&self, event: WidgetEvent) -> Result<()> {
        self.events.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(ev) => {
                TrackerError::Event(format!("event queue full, dropped {}", ev.kind()))
            }
            mpsc::error::TrySendError::Closed(ev) => {
                TrackerError::Event(format!("session loop is gone, dropped {}", ev.kind()))
            }
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// Drive `live` until the event channel closes or `shutdown` is cancelled
pub async fn run_session<S, M>(
    mut live: LiveSession<S, M>,
    mut events: mpsc::Receiver<WidgetEvent>,
    tick: Duration,
    shutdown: CancellationToken,
) -> LiveSession<S, M>
where
    S: WidgetSdk,
    M: MapSurface,
{
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("session loop started, tick every {tick:?}");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("session shutdown requested");
                break;
            }

            // a full event channel must not starve the tick
            _ = ticker.tick() => {
                live.tick();
            }

            event = events.recv() => {
                match event {
                    Some(event) => live.handle(&event),
                    None => {
                        warn!("event channel closed, stopping session loop");
                        break;
                    }
                }
            }
        }
    }

    live.shutdown();
    live
}

/// Spawn the session loop on the current runtime
pub fn spawn_session<S, M>(
    live: LiveSession<S, M>,
    config: &TrackerConfig,
) -> (SessionHandle, JoinHandle<LiveSession<S, M>>)
where
    S: WidgetSdk + Send + 'static,
    M: MapSurface + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));
    let shutdown = CancellationToken::new();
    let join = tokio::spawn(run_session(live, rx, config.tick_interval(), shutdown.clone()));

    (
        SessionHandle {
            events: tx,
            shutdown,
        },
        join,
    )
}
