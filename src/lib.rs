//! Live Tracker Library
//!
//! A Rust library for following a single GPS-tracked device on a map.
//! Telemetry pushed by a widget SDK is normalized into one canonical record,
//! and a once-per-second presentation tick turns that record into marker,
//! popup and speed-colored trail updates.
//!
//! # Features
//!
//! - **`runtime`** (default): tokio event loop driving a session from a channel
//! - **`cli`** (default): Build the command-line replay binary
//!
//! # Quick Start
//!
//! Normalize payloads into the canonical record:
//! ```rust
//! use live_tracker::{normalize, CanonicalTelemetry};
//! use serde_json::json;
//!
//! let mut state = CanonicalTelemetry::new();
//! normalize(&json!(r#"{"v":"{\"lat\":1.5,\"lon\":2.5}"}"#), &mut state);
//! normalize(&json!({"spd": "42.0", "sat": "7"}), &mut state);
//! assert_eq!((state.lat, state.lon, state.sat), (1.5, 2.5, 7));
//! ```
//!
//! Drive a session against an in-memory map surface:
//! ```rust
//! use live_tracker::{
//!     ChannelValues, LiveSession, RecordingSdk, RecordingSurface, TrackerConfig, ValuesEvent,
//!     WidgetEvent,
//! };
//! use serde_json::json;
//!
//! let config = TrackerConfig::default();
//! let mut live = LiveSession::new(RecordingSdk::new(), RecordingSurface::new(), &config);
//!
//! let mut values = ChannelValues::new();
//! values.insert("telemetry", json!("{\"lat\":45.81,\"lon\":15.97,\"spd\":85}"));
//! live.handle(&WidgetEvent::Values(ValuesEvent { values }));
//! live.tick();
//!
//! assert_eq!(live.surface.popup.unwrap().speed_color.to_string(), "rgb(255,82,0)");
//! ```
//!
//! # Public API
//!
//! ## Normalization
//! - [`normalize`] / [`Normalizer`] - Apply a raw payload to [`CanonicalTelemetry`]
//! - [`RawPayload`] - Resolved payload shape (string, double-encoded, object)
//! - [`extract_history_trail`] - Collect positions from a history response
//!
//! ## Presentation
//! - [`gradient_color`] - Speed to color
//! - [`TelemetrySession`] - Widget callbacks to canonical state
//! - [`PresentationDriver`] - Tick-driven marker, popup and trail updates
//! - [`MapSurface`] / [`WidgetSdk`] - Seams to the map library and widget SDK
//!
//! ## Replay and Export
//! - [`parse_event_log`] / [`replay`] - Run a recorded session offline
//! - [`export_to_gpx`] / [`export_to_geojson`] - Write trails to files

// Module declarations
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod gradient;
pub mod live;
pub mod parser;
pub mod render;
pub mod replay;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod sdk;
pub mod session;
pub mod surface;
pub mod types;

// Re-export everything from modules for convenience
pub use config::*;
pub use driver::*;
pub use error::*;
pub use export::*;
pub use gradient::*;
pub use live::*;
pub use parser::*;
pub use render::*;
pub use replay::*;
#[cfg(feature = "runtime")]
pub use runtime::*;
pub use sdk::*;
pub use session::*;
pub use surface::*;
pub use types::*;
