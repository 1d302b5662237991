//! Delivery-outcome types.

/// Result of attempting to deliver one alert.
///
/// Delivery is best-effort: a failed result is logged by the caller and
/// never retried inline, so this type reports rather than propagates.
#[derive(Debug, Clone)]
pub struct NotificationResult {
    /// Whether the alert was accepted by the channel.
    pub success: bool,
    /// The channel that processed this alert.
    pub channel: String,
    /// Optional message or error description.
    pub message: Option<String>,
    /// HTTP status code, if the channel speaks HTTP.
    pub status_code: Option<u16>,
}

impl NotificationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            status_code: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            status_code: None,
        }
    }

    /// Sets the status code.
    #[must_use]
    pub const fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}
