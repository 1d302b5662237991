//! Core types for the alerting engine.
//!
//! This module provides the fundamental types used throughout vigil:
//! - [`RequestEvent`]: one parsed access-log line
//! - [`FailoverSignal`]: an observed change of serving pool
//! - [`ErrorRateState`]: whether the error rate is currently breached
//! - [`AlertKind`]: the cooldown-tracked alert categories
//! - [`AlertEvent`]: a concrete alert decision with its payload data

use std::fmt;

use serde::{Deserialize, Serialize};

/// One parsed request record from the reverse-proxy access log.
///
/// `pool` and `upstream_status` are required; the remaining fields are
/// informational and never influence alerting decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// Identifier of the backend pool that served the request (e.g. "blue").
    pub pool: String,
    /// Free-form release/version tag.
    pub release: Option<String>,
    /// HTTP status code returned by the upstream, in [100, 599].
    pub upstream_status: u16,
    /// Address of the specific backend instance (`host:port`).
    pub upstream: Option<String>,
    /// Upstream processing time in seconds.
    pub request_time: Option<f64>,
}

impl RequestEvent {
    /// Returns true if the upstream answered with a server error (5xx).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.upstream_status >= 500 && self.upstream_status <= 599
    }
}

/// An observed change of the actively serving pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverSignal {
    /// The pool that was serving before the change.
    pub from: String,
    /// The pool that is serving now.
    pub to: String,
    /// Whether the change returns traffic to the configured primary pool.
    pub returned_to_primary: bool,
}

/// Whether the engine currently considers the error rate breached.
///
/// Tracking this explicitly is what makes breach/recovery alerts
/// edge-triggered: staying `Breached` across many breaching windows emits
/// nothing, only the transition does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorRateState {
    /// Error rate at or below the threshold.
    #[default]
    Normal,
    /// Error rate above the threshold.
    Breached,
}

impl ErrorRateState {
    /// Returns the state as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Breached => "breached",
        }
    }
}

impl fmt::Display for ErrorRateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The alert categories, each with an independent cooldown clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Traffic moved from one pool to another.
    Failover,
    /// The 5xx error rate rose above the threshold.
    HighErrorRate,
    /// The 5xx error rate fell back to or below the threshold.
    Recovered,
    /// Maintenance mode was enabled or disabled.
    MaintenanceToggle,
}

impl AlertKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Failover => "failover",
            Self::HighErrorRate => "high_error_rate",
            Self::Recovered => "recovered",
            Self::MaintenanceToggle => "maintenance_toggle",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete alert decision produced by the policy, carrying the data each
/// kind needs for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertEvent {
    /// Traffic moved between pools.
    Failover {
        /// The previously serving pool.
        from: String,
        /// The now-serving pool.
        to: String,
        /// Whether traffic returned to the configured primary pool.
        returned_to_primary: bool,
    },
    /// The error rate rose above the threshold.
    HighErrorRate {
        /// Computed 5xx percentage over the window.
        rate: f64,
        /// Number of requests the rate was computed over.
        window: usize,
    },
    /// The error rate recovered to or below the threshold.
    Recovered {
        /// Computed 5xx percentage over the window.
        rate: f64,
        /// Number of requests the rate was computed over.
        window: usize,
    },
    /// Maintenance mode changed state.
    MaintenanceToggle {
        /// True if maintenance mode is now enabled.
        enabled: bool,
    },
}

impl AlertEvent {
    /// Returns the alert kind of this event.
    #[must_use]
    pub const fn kind(&self) -> AlertKind {
        match self {
            Self::Failover { .. } => AlertKind::Failover,
            Self::HighErrorRate { .. } => AlertKind::HighErrorRate,
            Self::Recovered { .. } => AlertKind::Recovered,
            Self::MaintenanceToggle { .. } => AlertKind::MaintenanceToggle,
        }
    }

    /// Returns the computed error rate, for rate-derived alerts.
    #[must_use]
    pub const fn error_rate(&self) -> Option<f64> {
        match self {
            Self::HighErrorRate { rate, .. } | Self::Recovered { rate, .. } => Some(*rate),
            _ => None,
        }
    }

    /// Returns the pool now serving traffic, for failover alerts.
    #[must_use]
    pub fn pool(&self) -> Option<&str> {
        match self {
            Self::Failover { to, .. } => Some(to),
            _ => None,
        }
    }
}

impl fmt::Display for AlertEvent {
    /// Renders the plain-text message for this alert.
    ///
    /// Rates are always formatted with two decimal places.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failover {
                from,
                to,
                returned_to_primary,
            } => {
                if *returned_to_primary {
                    write!(
                        f,
                        "Primary pool `{to}` is serving traffic again (was `{from}`)"
                    )
                } else {
                    write!(f, "Failover detected! Pool switched from `{from}` -> `{to}`")
                }
            }
            Self::HighErrorRate { rate, window } => write!(
                f,
                "High error rate detected: {rate:.2}% 5xx responses over last {window} requests"
            ),
            Self::Recovered { rate, window } => write!(
                f,
                "Error rate recovered: {rate:.2}% 5xx responses over last {window} requests"
            ),
            Self::MaintenanceToggle { enabled } => {
                if *enabled {
                    write!(f, "Maintenance mode ENABLED - alerts suppressed")
                } else {
                    write!(f, "Maintenance mode DISABLED - alerts resumed")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod request_event_tests {
        use super::*;

        fn event(status: u16) -> RequestEvent {
            RequestEvent {
                pool: "blue".to_string(),
                release: None,
                upstream_status: status,
                upstream: None,
                request_time: None,
            }
        }

        #[test]
        fn server_error_bounds() {
            assert!(!event(200).is_server_error());
            assert!(!event(404).is_server_error());
            assert!(!event(499).is_server_error());
            assert!(event(500).is_server_error());
            assert!(event(503).is_server_error());
            assert!(event(599).is_server_error());
        }

        #[test]
        fn serialization_roundtrip() {
            let original = RequestEvent {
                pool: "green".to_string(),
                release: Some("v2.1.0".to_string()),
                upstream_status: 502,
                upstream: Some("10.0.0.5:8080".to_string()),
                request_time: Some(0.042),
            };

            let json = serde_json::to_string(&original).unwrap();
            let parsed: RequestEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, original);
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn state_default_is_normal() {
            assert_eq!(ErrorRateState::default(), ErrorRateState::Normal);
        }

        #[test]
        fn state_display() {
            assert_eq!(format!("{}", ErrorRateState::Normal), "normal");
            assert_eq!(format!("{}", ErrorRateState::Breached), "breached");
        }
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn kind_as_str() {
            assert_eq!(AlertKind::Failover.as_str(), "failover");
            assert_eq!(AlertKind::HighErrorRate.as_str(), "high_error_rate");
            assert_eq!(AlertKind::Recovered.as_str(), "recovered");
            assert_eq!(AlertKind::MaintenanceToggle.as_str(), "maintenance_toggle");
        }
    }

    mod alert_event_tests {
        use super::*;

        #[test]
        fn failover_message_names_both_pools() {
            let alert = AlertEvent::Failover {
                from: "blue".to_string(),
                to: "green".to_string(),
                returned_to_primary: false,
            };
            let msg = alert.to_string();
            assert!(msg.contains("`blue`"));
            assert!(msg.contains("`green`"));
            assert_eq!(alert.kind(), AlertKind::Failover);
            assert_eq!(alert.pool(), Some("green"));
        }

        #[test]
        fn failback_message_mentions_primary() {
            let alert = AlertEvent::Failover {
                from: "green".to_string(),
                to: "blue".to_string(),
                returned_to_primary: true,
            };
            assert!(alert.to_string().contains("serving traffic again"));
        }

        #[test]
        fn rate_messages_use_two_decimal_places() {
            let alert = AlertEvent::HighErrorRate {
                rate: 75.0,
                window: 4,
            };
            let msg = alert.to_string();
            assert!(msg.contains("75.00%"));
            assert!(msg.contains("last 4 requests"));
            assert_eq!(alert.error_rate(), Some(75.0));

            let recovered = AlertEvent::Recovered {
                rate: 1.234,
                window: 200,
            };
            assert!(recovered.to_string().contains("1.23%"));
        }

        #[test]
        fn maintenance_messages() {
            assert!(
                AlertEvent::MaintenanceToggle { enabled: true }
                    .to_string()
                    .contains("ENABLED")
            );
            assert!(
                AlertEvent::MaintenanceToggle { enabled: false }
                    .to_string()
                    .contains("DISABLED")
            );
        }

        #[test]
        fn serialization_tags_by_kind() {
            let alert = AlertEvent::HighErrorRate {
                rate: 4.5,
                window: 200,
            };
            let json = serde_json::to_string(&alert).unwrap();
            assert!(json.contains("\"kind\":\"high_error_rate\""));

            let parsed: AlertEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, alert);
        }
    }
}
