//! Access-log line parsing.
//!
//! Request records are whitespace-separated `key:value` tokens in any order:
//!
//! ```text
//! pool:blue release:v1-2-3 upstream_status:502 upstream:10.0.0.5:8080 request_time:0.042
//! ```
//!
//! Real access-log lines usually carry a free-form prefix (timestamps, the
//! request line, client address) before the structured tail; any token that
//! is not a recognized `key:value` pair is skipped.

use crate::error::ParseError;
use crate::types::RequestEvent;

/// Parses one raw log line into a [`RequestEvent`].
///
/// Pure function of its input. Unrecognized keys are ignored and recognized
/// keys may appear in any order; the last occurrence of a repeated key wins.
///
/// # Errors
///
/// Returns a [`ParseError`] if `pool` is missing, `upstream_status` is
/// missing, or `upstream_status` is not an integer in [100, 599]. These are
/// non-fatal: callers log and skip the line.
pub fn parse_line(line: &str) -> Result<RequestEvent, ParseError> {
    let mut pool: Option<&str> = None;
    let mut release: Option<&str> = None;
    let mut status_raw: Option<&str> = None;
    let mut upstream: Option<&str> = None;
    let mut request_time: Option<&str> = None;

    for token in line.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        match key {
            "pool" => pool = Some(value),
            "release" => release = Some(value),
            "upstream_status" => status_raw = Some(value),
            // upstream values are host:port, so keep the full remainder
            "upstream" => upstream = Some(value),
            "request_time" => request_time = Some(value),
            _ => {}
        }
    }

    let pool = pool.filter(|p| !p.is_empty()).ok_or(ParseError::MissingPool)?;
    let status_raw = status_raw.ok_or(ParseError::MissingStatus)?;

    let upstream_status: u16 = status_raw
        .parse()
        .ok()
        .filter(|s| (100..=599).contains(s))
        .ok_or_else(|| ParseError::InvalidStatus {
            value: status_raw.to_string(),
        })?;

    Ok(RequestEvent {
        pool: pool.to_string(),
        release: release.map(str::to_string),
        upstream_status,
        upstream: upstream.map(str::to_string),
        // informational only, a bad float never rejects the event
        request_time: request_time.and_then(|t| t.parse().ok()),
    })
}
