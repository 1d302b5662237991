//! Slack webhook channel.
//!
//! Renders alerts as Block Kit payloads and POSTs them to an incoming
//! webhook URL. Each alert kind gets its own attachment color, header emoji,
//! and title; rate alerts additionally carry a text gauge for the error
//! percentage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use vigil_engine::{AlertEvent, AlertKind};

use crate::error::{AlertsError, Result};
use crate::types::NotificationResult;
use crate::Notifier;

/// Width of the error-rate gauge in the Slack payload, in cells.
const GAUGE_CELLS: usize = 20;
/// Each gauge cell represents this many percentage points.
const GAUGE_STEP: f64 = 5.0;

/// A text object inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Slack text type, `plain_text` or `mrkdwn`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The text content.
    pub text: String,
    /// Whether emoji shortcodes are rendered (plain_text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl Text {
    /// Creates a `plain_text` object with emoji rendering enabled.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: "plain_text".to_string(),
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Creates a `mrkdwn` text object.
    #[must_use]
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }
}

/// One Block Kit block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// A header line.
    Header {
        /// Header text (plain_text).
        text: Text,
    },
    /// A section with optional side-by-side fields and/or body text.
    Section {
        /// Side-by-side field texts.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
        /// Body text.
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
    },
    /// A small-print context line.
    Context {
        /// Context elements.
        elements: Vec<Text>,
    },
}

/// A legacy attachment, used only to color the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Hex color for the message gutter.
    pub color: String,
}

/// The full webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackPayload {
    /// Block Kit blocks.
    pub blocks: Vec<Block>,
    /// Color attachments.
    pub attachments: Vec<Attachment>,
}

impl SlackPayload {
    /// Renders the payload for an alert at the given timestamp.
    #[must_use]
    pub fn for_alert(alert: &AlertEvent, now: DateTime<Utc>) -> Self {
        let (color, emoji, title) = match alert.kind() {
            AlertKind::Failover => ("#FF0000", "\u{1f6a8}", "Failover Detected!"),
            AlertKind::HighErrorRate => ("#FFA500", "\u{26a0}\u{fe0f}", "High Error Rate Detected!"),
            AlertKind::Recovered | AlertKind::MaintenanceToggle => {
                ("#36C5F0", "\u{2705}", "Alert Notification")
            }
        };

        let mut fields = Vec::new();
        if let Some(pool) = alert.pool() {
            fields.push(Text::mrkdwn(format!("*Active Pool:*\n`{pool}`")));
        }
        if let Some(rate) = alert.error_rate() {
            fields.push(Text::mrkdwn(format!(
                "*Error Rate:*\n`{rate:.2}%`\n{}",
                gauge(rate)
            )));
        }

        let blocks = vec![
            Block::Header {
                text: Text::plain(format!("{emoji} {title}")),
            },
            Block::Section { fields, text: None },
            Block::Section {
                fields: Vec::new(),
                text: Some(Text::mrkdwn(alert.to_string())),
            },
            Block::Context {
                elements: vec![Text::mrkdwn(format!(
                    "\u{1f552} *Timestamp:* {}",
                    now.format("%Y-%m-%d %H:%M:%S UTC")
                ))],
            },
        ];

        Self {
            blocks,
            attachments: vec![Attachment {
                color: color.to_string(),
            }],
        }
    }
}

/// Renders a filled/empty bar gauge for a percentage.
fn gauge(rate: f64) -> String {
    let filled = ((rate / GAUGE_STEP).floor().max(0.0) as usize).min(GAUGE_CELLS);
    let mut bar = "\u{2588}".repeat(filled);
    bar.push_str(&"\u{2591}".repeat(GAUGE_CELLS - filled));
    bar
}

/// Sends alerts to a Slack incoming webhook.
///
/// Delivery is bounded by the client timeout; a slow or unreachable webhook
/// fails the individual send without ever blocking log processing for
/// unbounded time.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    /// Default per-request delivery timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a notifier for the given webhook URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `AlertsError::InvalidConfig` if the URL is empty, or a
    /// transport error if the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    /// Creates a notifier with a custom delivery timeout.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(AlertsError::InvalidConfig {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for SlackNotifier {
    fn notify(
        &self,
        alert: &AlertEvent,
    ) -> impl Future<Output = Result<NotificationResult>> + Send {
        let payload = SlackPayload::for_alert(alert, Utc::now());
        async move {
            debug!(url = %self.url, kind = %alert.kind(), "posting webhook alert");

            let response = self.client.post(&self.url).json(&payload).send().await?;
            let status = response.status();

            if status.is_success() {
                Ok(NotificationResult::success("slack").with_status_code(status.as_u16()))
            } else {
                Ok(
                    NotificationResult::failure("slack", format!("webhook returned {status}"))
                        .with_status_code(status.as_u16()),
                )
            }
        }
    }
}
