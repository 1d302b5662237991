//! vigild - log-driven failover and error-rate alerting daemon
//!
//! Tails a reverse-proxy access log, tracks which backend pool is serving
//! traffic and the 5xx rate over a sliding window, and posts alerts to a
//! Slack webhook when either goes wrong.

mod config;
mod pipeline;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vigil_alerts::{LogNotifier, Notifier, SlackNotifier};
use vigil_tail::{LogTailer, TailerConfig};

use config::{Cli, WatcherConfig};
use pipeline::Watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("vigild=info".parse()?))
        .init();

    let config = WatcherConfig::from_cli(Cli::parse())?;

    info!(
        log = %config.log_path.display(),
        pool = %config.active_pool,
        threshold = config.error_rate_threshold,
        window = config.window_size,
        cooldown_secs = config.alert_cooldown_sec,
        dry_run = config.dry_run,
        "starting vigild"
    );

    let tailer = LogTailer::start(
        TailerConfig::new(&config.log_path)
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms)),
    )
    .await;
    let watcher = Watcher::new(&config).context("building detection pipeline")?;

    if config.dry_run {
        run(tailer, watcher, &LogNotifier).await
    } else {
        let url = config
            .slack_webhook_url
            .clone()
            .context("webhook URL missing after validation")?;
        let notifier = SlackNotifier::new(url).context("building Slack notifier")?;
        run(tailer, watcher, &notifier).await
    }
}

/// Feeds tailed lines through the pipeline until interrupted.
async fn run<N: Notifier>(
    mut tailer: LogTailer,
    mut watcher: Watcher,
    notifier: &N,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            line = tailer.next_line() => {
                watcher.handle_line(&line, notifier, Utc::now()).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, exiting");
                return Ok(());
            }
        }
    }
}
