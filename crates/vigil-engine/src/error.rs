//! Error types for the vigil-engine crate.

use thiserror::Error;

/// Errors that can occur in the alerting engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid engine configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// A log line could not be parsed into a request event.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Failures when parsing a single log line.
///
/// Parse failures are non-fatal: the pipeline logs them and moves on. They
/// are typed so malformed lines can be reported distinctly from lines that
/// simply are not request records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line carries no `pool:` token.
    #[error("missing required field: pool")]
    MissingPool,

    /// The line carries no `upstream_status:` token.
    #[error("missing required field: upstream_status")]
    MissingStatus,

    /// The `upstream_status` value is not an integer in [100, 599].
    #[error("invalid upstream_status: {value}")]
    InvalidStatus {
        /// The raw value that failed to parse.
        value: String,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
