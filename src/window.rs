//! Session window calculation
//!
//! The metered service enforces a 5-hour rolling usage window anchored to
//! the top of the hour of first activity. When a window has already
//! expired relative to "now", a new one is anchored to the most recent
//! activity instead (rollover). The computation is a pure function of the
//! day summary and the supplied clock value.

use crate::types::UsageSummary;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Length of the rolling session window in seconds (5 hours)
pub const SESSION_WINDOW_SECONDS: i64 = 5 * 60 * 60;

/// The current 5-hour usage window
///
/// Invariant: `end_time = start_time + 5h`. Usage fields mirror the
/// summary the window was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Window start, on an hour boundary
    pub start_time: DateTime<Utc>,
    /// Window end, exactly 5 hours after the start
    pub end_time: DateTime<Utc>,
    /// Total tokens at computation time
    pub token_usage: u64,
    /// Estimated cost at computation time
    pub cost_usage: f64,
    /// Message count at computation time
    pub message_count: usize,
}

impl SessionWindow {
    /// Whether the window is still open at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.end_time
    }

    /// Time left in the window, zero once expired
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end_time - now).max(Duration::zero())
    }
}

/// Compute the current session window from a day summary
///
/// Returns `None` when the summary has no first timestamp (no activity
/// yet). The window starts at the first timestamp truncated to the top of
/// its hour; if that window has already ended before `now`, it rolls over
/// to a new window anchored to the summary's `last_updated` instead.
///
/// The usage figures attached to the window are the summary's existing
/// totals in both branches; the rollover branch deliberately does not
/// re-aggregate within the new bounds.
pub fn compute_window(summary: &UsageSummary, now: DateTime<Utc>) -> Option<SessionWindow> {
    let first = summary.first_timestamp?;

    let mut start = floor_to_hour(first);
    let mut end = start + Duration::seconds(SESSION_WINDOW_SECONDS);

    if end < now {
        // Window expired: re-anchor to the most recent activity.
        start = floor_to_hour(summary.last_updated);
        end = start + Duration::seconds(SESSION_WINDOW_SECONDS);
    }

    Some(SessionWindow {
        start_time: start,
        end_time: end,
        token_usage: summary.total_tokens(),
        cost_usage: summary.estimated_cost,
        message_count: summary.message_count,
    })
}

/// Truncate to the top of the hour (minutes, seconds, nanoseconds zeroed)
fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}
