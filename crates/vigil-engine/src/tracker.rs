//! Last-seen pool tracking and failover detection.

use crate::types::FailoverSignal;

/// Remembers the last observed serving pool and reports identity changes.
///
/// The tracker is edge-triggered: a signal is produced exactly when an
/// observation differs from the immediately prior one. The stored value is
/// seeded from configuration, so a deployment that starts in an unexpected
/// pool signals on its very first observation.
#[derive(Debug, Clone)]
pub struct PoolTracker {
    /// The configured primary pool, used to flag fail-back transitions.
    primary: String,
    /// The most recently observed pool.
    current: String,
}

impl PoolTracker {
    /// Creates a tracker seeded with the configured primary pool identity.
    #[must_use]
    pub fn new(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        Self {
            current: primary.clone(),
            primary,
        }
    }

    /// Returns the most recently observed pool.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Records an observation, returning a failover signal iff the pool
    /// differs from the previous observation.
    pub fn observe(&mut self, pool: &str) -> Option<FailoverSignal> {
        if pool == self.current {
            return None;
        }

        let signal = FailoverSignal {
            from: std::mem::replace(&mut self.current, pool.to_string()),
            to: pool.to_string(),
            returned_to_primary: pool == self.primary,
        };
        Some(signal)
    }
}
