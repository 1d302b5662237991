//! Error types for the vigil-alerts crate.

use thiserror::Error;

/// Errors that can occur while rendering or delivering alerts.
#[derive(Debug, Error)]
pub enum AlertsError {
    /// Invalid notifier configuration.
    #[error("invalid notifier configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Payload serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The HTTP request to the webhook failed (transport-level).
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<serde_json::Error> for AlertsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for alert delivery operations.
pub type Result<T> = std::result::Result<T, AlertsError>;
