//! The per-line processing pipeline.
//!
//! One [`Watcher`] owns all detection state and runs the same sequence for
//! every log line: parse, record into the window, check for a pool switch,
//! evaluate the alert policy, deliver whatever it produced. Lines are
//! processed strictly in file order on a single task, so no locking is
//! needed anywhere in the hot path.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vigil_alerts::Notifier;
use vigil_engine::{
    AlertPolicy, MaintenanceGate, Observation, PolicyConfig, PoolTracker, SlidingWindow,
    parse_line,
};

use crate::config::WatcherConfig;

/// All per-run detection state, driven one log line at a time.
pub struct Watcher {
    window: SlidingWindow,
    tracker: PoolTracker,
    policy: AlertPolicy,
    gate: MaintenanceGate,
}

impl Watcher {
    /// Builds the pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be constructed, which a
    /// validated configuration rules out.
    pub fn new(config: &WatcherConfig) -> vigil_engine::Result<Self> {
        Ok(Self {
            window: SlidingWindow::new(config.window_size)?,
            tracker: PoolTracker::new(config.active_pool.clone()),
            policy: AlertPolicy::new(PolicyConfig {
                error_rate_threshold: config.error_rate_threshold,
                cooldown_secs: config.alert_cooldown_sec,
            }),
            gate: MaintenanceGate::new(config.maintenance_file.clone()),
        })
    }

    /// Processes one log line end to end and returns the alerts that were
    /// handed to the notifier.
    ///
    /// Unparseable lines are skipped with a debug log; delivery failures
    /// are logged and never propagate, so the tail loop cannot stall on a
    /// broken channel.
    pub async fn handle_line<N: Notifier>(
        &mut self,
        line: &str,
        notifier: &N,
        now: DateTime<Utc>,
    ) -> usize {
        let event = match parse_line(line) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, line, "skipping unparseable log line");
                return 0;
            }
        };

        let failover = self.tracker.observe(&event.pool);
        self.window.record(event);

        let observation = Observation {
            failover,
            error_rate: self.window.error_rate(),
            window_len: self.window.len(),
            maintenance_active: self.gate.is_active(),
        };
        debug!(
            rate = observation.error_rate,
            errors = self.window.error_count(),
            window = self.window.len(),
            "window state"
        );

        let prev_state = self.policy.rate_state();
        let alerts = self.policy.evaluate(&observation, now);
        let state = self.policy.rate_state();
        if state != prev_state {
            info!(rate = observation.error_rate, state = %state, "error rate state changed");
        }

        for alert in &alerts {
            match notifier.notify(alert).await {
                Ok(result) if result.success => {
                    info!(kind = %alert.kind(), channel = %result.channel, "alert delivered");
                }
                Ok(result) => {
                    warn!(
                        kind = %alert.kind(),
                        channel = %result.channel,
                        status = ?result.status_code,
                        message = ?result.message,
                        "alert delivery rejected"
                    );
                }
                Err(e) => {
                    warn!(kind = %alert.kind(), error = %e, "alert delivery failed");
                }
            }
        }
        alerts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::MakeWriter;
    use vigil_alerts::{NotificationResult, Result as AlertsResult};
    use vigil_engine::{AlertEvent, AlertKind};

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Records every alert it is asked to deliver.
    #[derive(Default)]
    struct CaptureNotifier {
        sent: Mutex<Vec<AlertEvent>>,
    }

    impl CaptureNotifier {
        fn taken(&self) -> Vec<AlertEvent> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for CaptureNotifier {
        fn notify(
            &self,
            alert: &AlertEvent,
        ) -> impl Future<Output = AlertsResult<NotificationResult>> + Send {
            self.sent.lock().unwrap().push(alert.clone());
            std::future::ready(Ok(NotificationResult::success("capture")))
        }
    }

    fn test_config(maintenance_file: PathBuf) -> WatcherConfig {
        WatcherConfig {
            log_path: PathBuf::from("/tmp/access.log"),
            active_pool: "blue".to_string(),
            error_rate_threshold: 50.0,
            window_size: 4,
            alert_cooldown_sec: 300,
            maintenance_file,
            slack_webhook_url: None,
            poll_interval_ms: 100,
            dry_run: true,
        }
    }

    fn line(pool: &str, status: u16) -> String {
        format!("pool:{pool} release:v1 upstream_status:{status}")
    }

    mod pipeline_tests {
        use super::*;
        use chrono::TimeZone;

        #[tokio::test]
        async fn breach_fires_only_when_rate_crosses_threshold() {
            let dir = tempfile::tempdir().unwrap();
            let mut watcher =
                Watcher::new(&test_config(dir.path().join("maintenance"))).unwrap();
            let notifier = CaptureNotifier::default();
            let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

            // 2 of 4 is exactly 50%, not above it.
            for status in [200, 200, 500, 500] {
                watcher.handle_line(&line("blue", status), &notifier, now).await;
            }
            assert!(notifier.taken().is_empty());

            // The fifth event evicts the oldest 200, leaving 3 of 4.
            watcher.handle_line(&line("blue", 500), &notifier, now).await;
            let sent = notifier.taken();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].kind(), AlertKind::HighErrorRate);
        }

        #[tokio::test]
        async fn pool_switch_fires_failover_alert() {
            let dir = tempfile::tempdir().unwrap();
            let mut watcher =
                Watcher::new(&test_config(dir.path().join("maintenance"))).unwrap();
            let notifier = CaptureNotifier::default();
            let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

            watcher.handle_line(&line("blue", 200), &notifier, now).await;
            watcher.handle_line(&line("green", 200), &notifier, now).await;

            let sent = notifier.taken();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].kind(), AlertKind::Failover);
        }

        #[tokio::test]
        async fn malformed_lines_are_skipped() {
            let dir = tempfile::tempdir().unwrap();
            let mut watcher =
                Watcher::new(&test_config(dir.path().join("maintenance"))).unwrap();
            let notifier = CaptureNotifier::default();
            let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

            let delivered = watcher
                .handle_line("this is not a structured line", &notifier, now)
                .await;
            assert_eq!(delivered, 0);
            assert!(notifier.taken().is_empty());
        }

        #[tokio::test]
        async fn breach_state_change_is_logged_at_info() {
            let buffer = LogBuffer::default();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(buffer.clone())
                .with_max_level(tracing::Level::INFO)
                .finish();

            async {
                let dir = tempfile::tempdir().unwrap();
                let mut watcher =
                    Watcher::new(&test_config(dir.path().join("maintenance"))).unwrap();
                let notifier = CaptureNotifier::default();
                let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

                // a single 500 makes the rate 100%, straight into breach
                watcher.handle_line(&line("blue", 500), &notifier, now).await;
            }
            .with_subscriber(subscriber)
            .await;

            assert!(buffer.contents().contains("error rate state changed"));
        }

        #[tokio::test]
        async fn maintenance_marker_suppresses_delivery() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("maintenance");
            std::fs::write(&marker, b"").unwrap();

            let mut watcher = Watcher::new(&test_config(marker)).unwrap();
            let notifier = CaptureNotifier::default();
            let now = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();

            // The marker edge itself is announced; the failover on the same
            // line is suppressed.
            watcher.handle_line(&line("green", 200), &notifier, now).await;
            let sent = notifier.taken();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].kind(), AlertKind::MaintenanceToggle);
        }
    }
}
