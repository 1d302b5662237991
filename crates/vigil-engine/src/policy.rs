//! The alert-decision policy.
//!
//! The policy consumes one [`Observation`] per processed log line and decides
//! which alerts to emit. Three guards apply, in order:
//!
//! 1. **Edge triggering**: breach/recovery alerts fire only on a state
//!    transition, and failover alerts only on a tracker signal. Staying
//!    breached emits nothing.
//! 2. **Maintenance suppression**: while the gate is active nothing is
//!    delivered, but all internal state still advances so no backlog of
//!    stale alerts replays when maintenance ends.
//! 3. **Cooldown**: a per-kind minimum interval between deliveries guards
//!    against rapid flapping across the threshold. Suppressed candidates do
//!    not reset the clock.
//!
//! The clock is an explicit argument so tests are deterministic.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::types::{AlertEvent, AlertKind, ErrorRateState, FailoverSignal};

/// Thresholds governing the policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyConfig {
    /// Percentage above which the error rate is considered breached.
    pub error_rate_threshold: f64,
    /// Minimum seconds between two delivered alerts of the same kind.
    pub cooldown_secs: u64,
}

/// Everything the policy needs for one evaluation, passed explicitly rather
/// than read from ambient state.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Failover signal from the pool tracker, if this event changed pools.
    pub failover: Option<FailoverSignal>,
    /// Current 5xx percentage over the window.
    pub error_rate: f64,
    /// Number of events the rate was computed over.
    pub window_len: usize,
    /// Whether the maintenance gate is currently active.
    pub maintenance_active: bool,
}

/// Per-kind cooldown and transition state for alert decisions.
#[derive(Debug)]
pub struct AlertPolicy {
    config: PolicyConfig,
    rate_state: ErrorRateState,
    maintenance_prev: bool,
    last_sent: HashMap<AlertKind, DateTime<Utc>>,
}

impl AlertPolicy {
    /// Creates a policy with all cooldowns expired and the rate considered
    /// normal.
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            rate_state: ErrorRateState::Normal,
            maintenance_prev: false,
            last_sent: HashMap::new(),
        }
    }

    /// Returns the current breach state.
    #[must_use]
    pub const fn rate_state(&self) -> ErrorRateState {
        self.rate_state
    }

    /// Evaluates one observation, returning the alerts to deliver.
    ///
    /// State transitions (breach flag, maintenance edge, pool identity via
    /// the tracker upstream) always happen; only delivery is gated.
    pub fn evaluate(&mut self, obs: &Observation, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let mut emitted = Vec::new();

        // The toggle alert reports the maintenance flag itself, so it is
        // exempt from maintenance suppression and gated only by its own
        // cooldown kind.
        if obs.maintenance_active != self.maintenance_prev {
            self.maintenance_prev = obs.maintenance_active;
            let alert = AlertEvent::MaintenanceToggle {
                enabled: obs.maintenance_active,
            };
            if self.cooldown_expired(AlertKind::MaintenanceToggle, now) {
                self.mark_sent(AlertKind::MaintenanceToggle, now);
                emitted.push(alert);
            } else {
                debug!(kind = %AlertKind::MaintenanceToggle, "alert suppressed by cooldown");
            }
        }

        if let Some(signal) = &obs.failover {
            self.emit_guarded(
                AlertEvent::Failover {
                    from: signal.from.clone(),
                    to: signal.to.clone(),
                    returned_to_primary: signal.returned_to_primary,
                },
                obs.maintenance_active,
                now,
                &mut emitted,
            );
        }

        match self.rate_state {
            ErrorRateState::Normal if obs.error_rate > self.config.error_rate_threshold => {
                self.rate_state = ErrorRateState::Breached;
                self.emit_guarded(
                    AlertEvent::HighErrorRate {
                        rate: obs.error_rate,
                        window: obs.window_len,
                    },
                    obs.maintenance_active,
                    now,
                    &mut emitted,
                );
            }
            ErrorRateState::Breached if obs.error_rate <= self.config.error_rate_threshold => {
                self.rate_state = ErrorRateState::Normal;
                self.emit_guarded(
                    AlertEvent::Recovered {
                        rate: obs.error_rate,
                        window: obs.window_len,
                    },
                    obs.maintenance_active,
                    now,
                    &mut emitted,
                );
            }
            _ => {}
        }

        emitted
    }

    /// Applies maintenance then cooldown suppression to a candidate alert,
    /// resetting the kind's cooldown clock only when it is actually emitted.
    fn emit_guarded(
        &mut self,
        alert: AlertEvent,
        maintenance_active: bool,
        now: DateTime<Utc>,
        emitted: &mut Vec<AlertEvent>,
    ) {
        let kind = alert.kind();

        if maintenance_active {
            debug!(kind = %kind, alert = %alert, "alert suppressed by maintenance mode");
            return;
        }
        if !self.cooldown_expired(kind, now) {
            debug!(kind = %kind, alert = %alert, "alert suppressed by cooldown");
            return;
        }

        self.mark_sent(kind, now);
        emitted.push(alert);
    }

    fn cooldown_expired(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_sent.get(&kind) else {
            return true;
        };
        now - *last >= Duration::seconds(self.config.cooldown_secs as i64)
    }

    fn mark_sent(&mut self, kind: AlertKind, now: DateTime<Utc>) {
        self.last_sent.insert(kind, now);
    }
}
