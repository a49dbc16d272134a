use thiserror::Error;

/// Error types for telemetry handling
///
/// Nothing in the session is fatal: handlers return these and the dispatch
/// boundary logs and drops them.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Widget event that cannot be handled
    #[error("Event error: {0}")]
    Event(String),
    /// Failure reported by the widget SDK
    #[error("Widget SDK error: {0}")]
    Sdk(String),
    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),
    /// Malformed line in a recorded event log
    #[error("Replay error at line {line}: {message}")]
    Replay { line: usize, message: String },
    /// Export format error
    #[error("Export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
