//! Alert rendering and delivery for vigil.
//!
//! The engine decides *what* to alert on; this crate decides *how it looks*
//! and *where it goes*. Delivery is strictly best-effort, attempted rather
//! than confirmed: a failed send is logged by the caller and the next
//! qualifying event re-attempts naturally, with no retry queue and no
//! ordering guarantee.
//!
//! Two channels are provided:
//! - [`SlackNotifier`]: Block Kit payloads POSTed to an incoming webhook
//!   with a bounded timeout.
//! - [`LogNotifier`]: writes alerts to the process log only, for dry runs
//!   and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod slack;
pub mod types;

pub use error::{AlertsError, Result};
pub use slack::{SlackNotifier, SlackPayload};
pub use types::NotificationResult;

use tracing::{error, info};
use vigil_engine::{AlertEvent, AlertKind};

/// A channel that can deliver one alert.
///
/// Implementations report the outcome in a [`NotificationResult`] when the
/// channel was reachable, and an error for transport-level failures; either
/// way the caller logs and moves on.
pub trait Notifier {
    /// Delivers one alert, best-effort.
    fn notify(
        &self,
        alert: &AlertEvent,
    ) -> impl Future<Output = Result<NotificationResult>> + Send;
}

/// A notifier that only writes alerts to the process log.
///
/// Used by `--dry-run` and as the delivery stub in tests.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        alert: &AlertEvent,
    ) -> impl Future<Output = Result<NotificationResult>> + Send {
        match alert.kind() {
            AlertKind::Failover | AlertKind::HighErrorRate => {
                error!(kind = %alert.kind(), "ALERT: {alert}");
            }
            AlertKind::Recovered | AlertKind::MaintenanceToggle => {
                info!(kind = %alert.kind(), "ALERT: {alert}");
            }
        }
        std::future::ready(Ok(
            NotificationResult::success("log").with_message("logged to tracing")
        ))
    }
}
