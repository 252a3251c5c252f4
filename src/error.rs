//! Error types for media-dl
//!
//! Per-item download and conversion failures are never surfaced through this
//! module: they are recorded in-band on [`crate::types::DownloadRecord`] and
//! [`crate::types::ConversionOutcome`]. The variants here cover setup-level
//! problems only (bad configuration, unknown user, missing encoder binary),
//! which are the only failures that abort a run.

use thiserror::Error;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.max_concurrent_downloads")
        key: Option<String>,
    },

    /// Catalog lookup failed (unknown service/user, malformed listing)
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A single fetch failed (non-2xx status); recorded on the download
    /// record by the transfer pool, never propagated out of a batch
    #[error("transfer error: {0}")]
    Transfer(String),

    /// External tool execution failed (ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for configuration errors
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_message() {
        let err = Error::config("parallel downloads must be between 1 and 5", "download.parallel");
        assert_eq!(
            err.to_string(),
            "configuration error: parallel downloads must be between 1 and 5"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
