//! Error types for the vigil-tail crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while tailing a log file.
///
/// These are always transient from the caller's perspective: the tailer
/// logs them and retries, it never propagates them out of the read loop.
#[derive(Debug, Error)]
pub enum TailError {
    /// The log file could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading from the log file failed.
    #[error("failed to read from log file '{path}': {source}")]
    Read {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type for tail operations.
pub type Result<T> = std::result::Result<T, TailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_path() {
        let err = TailError::Open {
            path: PathBuf::from("/var/log/nginx/access.log"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/nginx/access.log"));
        assert!(msg.starts_with("failed to open"));
    }
}
