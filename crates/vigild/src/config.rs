//! Command-line and environment configuration for the watcher daemon.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

/// Errors produced while validating the daemon configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Human-readable explanation.
        reason: String,
    },
}

/// Command-line arguments. Every flag falls back to an environment
/// variable so the daemon can run under a process supervisor with no
/// argv at all.
#[derive(Debug, Parser)]
#[command(name = "vigild", version, about = "Log-driven failover and error-rate alerting daemon")]
pub struct Cli {
    /// Access log to tail.
    #[arg(long, env = "LOG_PATH", default_value = "/var/log/nginx/access.log")]
    pub log_path: PathBuf,

    /// Pool expected to serve traffic under normal conditions.
    #[arg(long, env = "ACTIVE_POOL", default_value = "blue")]
    pub active_pool: String,

    /// 5xx percentage above which an alert fires.
    #[arg(long, env = "ERROR_RATE_THRESHOLD", default_value_t = 2.0)]
    pub error_rate_threshold: f64,

    /// Number of recent requests the error rate is computed over.
    #[arg(long, env = "WINDOW_SIZE", default_value_t = 200)]
    pub window_size: usize,

    /// Minimum seconds between repeat alerts of the same kind.
    #[arg(long, env = "ALERT_COOLDOWN_SEC", default_value_t = 300)]
    pub alert_cooldown_sec: u64,

    /// Marker file whose presence suppresses outbound alerts.
    #[arg(long, env = "MAINTENANCE_FILE", default_value = "/var/run/vigil/maintenance")]
    pub maintenance_file: PathBuf,

    /// Slack incoming-webhook URL. Required unless --dry-run is set.
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: Option<String>,

    /// How often to poll the log file for new data, in milliseconds.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 100)]
    pub poll_interval_ms: u64,

    /// Log alerts locally instead of delivering them to Slack.
    #[arg(long, env = "DRY_RUN", default_value_t = false)]
    pub dry_run: bool,
}

/// Validated daemon configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Access log to tail.
    pub log_path: PathBuf,
    /// Pool expected to serve traffic under normal conditions.
    pub active_pool: String,
    /// 5xx percentage above which an alert fires.
    pub error_rate_threshold: f64,
    /// Number of recent requests the error rate is computed over.
    pub window_size: usize,
    /// Minimum seconds between repeat alerts of the same kind.
    pub alert_cooldown_sec: u64,
    /// Marker file whose presence suppresses outbound alerts.
    pub maintenance_file: PathBuf,
    /// Slack incoming-webhook URL, absent in dry-run mode.
    pub slack_webhook_url: Option<String>,
    /// How often to poll the log file for new data, in milliseconds.
    pub poll_interval_ms: u64,
    /// Log alerts locally instead of delivering them to Slack.
    pub dry_run: bool,
}

impl WatcherConfig {
    /// Validates parsed arguments into a runnable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the window is empty, the
    /// threshold is not a finite non-negative number, the active pool
    /// is blank, or no webhook is configured outside dry-run mode.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.window_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "window size must be at least 1".to_string(),
            });
        }
        if !cli.error_rate_threshold.is_finite() || cli.error_rate_threshold < 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "error rate threshold must be a finite non-negative percentage, got {}",
                    cli.error_rate_threshold
                ),
            });
        }
        if cli.active_pool.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "active pool name must not be blank".to_string(),
            });
        }
        if cli.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "poll interval must be at least 1ms".to_string(),
            });
        }
        if !cli.dry_run {
            match &cli.slack_webhook_url {
                Some(url) if !url.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid {
                        reason: "a Slack webhook URL is required unless --dry-run is set"
                            .to_string(),
                    });
                }
            }
        }

        Ok(Self {
            log_path: cli.log_path,
            active_pool: cli.active_pool,
            error_rate_threshold: cli.error_rate_threshold,
            window_size: cli.window_size,
            alert_cooldown_sec: cli.alert_cooldown_sec,
            maintenance_file: cli.maintenance_file,
            slack_webhook_url: cli.slack_webhook_url,
            poll_interval_ms: cli.poll_interval_ms,
            dry_run: cli.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod validation_tests {
        use super::*;

        fn base_cli() -> Cli {
            Cli::parse_from(["vigild", "--dry-run"])
        }

        #[test]
        fn defaults_are_accepted_in_dry_run() {
            let config = WatcherConfig::from_cli(base_cli()).unwrap();
            assert_eq!(config.active_pool, "blue");
            assert_eq!(config.window_size, 200);
            assert!((config.error_rate_threshold - 2.0).abs() < f64::EPSILON);
            assert_eq!(config.alert_cooldown_sec, 300);
            assert_eq!(config.poll_interval_ms, 100);
        }

        #[test]
        fn zero_window_is_rejected() {
            let mut cli = base_cli();
            cli.window_size = 0;
            assert!(WatcherConfig::from_cli(cli).is_err());
        }

        #[test]
        fn non_finite_threshold_is_rejected() {
            let mut cli = base_cli();
            cli.error_rate_threshold = f64::NAN;
            assert!(WatcherConfig::from_cli(cli).is_err());

            let mut cli = base_cli();
            cli.error_rate_threshold = -1.0;
            assert!(WatcherConfig::from_cli(cli).is_err());
        }

        #[test]
        fn blank_pool_is_rejected() {
            let mut cli = base_cli();
            cli.active_pool = "  ".to_string();
            assert!(WatcherConfig::from_cli(cli).is_err());
        }

        #[test]
        fn webhook_required_outside_dry_run() {
            let mut cli = base_cli();
            cli.dry_run = false;
            cli.slack_webhook_url = None;
            assert!(WatcherConfig::from_cli(cli).is_err());

            let mut cli = base_cli();
            cli.dry_run = false;
            cli.slack_webhook_url = Some("https://hooks.slack.com/services/T/B/X".to_string());
            assert!(WatcherConfig::from_cli(cli).is_ok());
        }

        #[test]
        fn flags_override_defaults() {
            let cli = Cli::parse_from([
                "vigild",
                "--dry-run",
                "--active-pool",
                "green",
                "--window-size",
                "50",
                "--error-rate-threshold",
                "5.5",
            ]);
            let config = WatcherConfig::from_cli(cli).unwrap();
            assert_eq!(config.active_pool, "green");
            assert_eq!(config.window_size, 50);
            assert!((config.error_rate_threshold - 5.5).abs() < f64::EPSILON);
        }
    }
}
