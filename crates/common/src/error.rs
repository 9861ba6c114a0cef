//! Error types shared across Panframe crates.

use std::path::PathBuf;

/// Top-level error type for Panframe operations.
///
/// Geometry problems never surface here: degenerate rectangles are
/// resolved by clamping. Everything below is terminal for the operation
/// that raised it and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum PanframeError {
    #[error("Invalid time range: {message}")]
    InvalidTimeRange { message: String },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    #[error("Recording error: {message}")]
    Recording { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Export aborted")]
    Aborted,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PanframeError.
pub type PanframeResult<T> = Result<T, PanframeError>;

impl PanframeError {
    pub fn invalid_time_range(msg: impl Into<String>) -> Self {
        Self::InvalidTimeRange {
            message: msg.into(),
        }
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            message: msg.into(),
        }
    }

    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the export request was rejected before any pipeline work.
    pub fn is_rejected_request(&self) -> bool {
        matches!(self, Self::InvalidTimeRange { .. } | Self::Session { .. })
    }
}
