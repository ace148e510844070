//! Per-file aggregation of usage records
//!
//! Reads one transcript file, decodes each line, filters by an optional
//! cutoff timestamp, and folds the accepted records into a
//! [`UsageSummary`]. Read failures degrade to the empty summary: one
//! unreadable file must never abort a refresh cycle.

use crate::record;
use crate::types::{TokenCounts, UsageSummary};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Aggregate one transcript file into a summary
///
/// Records with a timestamp strictly earlier than `cutoff` are excluded;
/// records without a parseable timestamp cannot be time-filtered and are
/// always included. An unreadable or non-UTF-8 file yields
/// [`UsageSummary::empty`].
pub async fn aggregate_file(path: &Path, cutoff: Option<DateTime<Utc>>) -> UsageSummary {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("could not read {}: {e}", path.display());
            return UsageSummary::empty();
        }
    };
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            debug!("{} is not valid UTF-8, skipping", path.display());
            return UsageSummary::empty();
        }
    };

    let mut tokens = TokenCounts::default();
    let mut estimated_cost = 0.0;
    let mut session_ids = HashSet::new();
    let mut message_count = 0usize;
    let mut first_timestamp: Option<DateTime<Utc>> = None;
    let mut last_timestamp: Option<DateTime<Utc>> = None;

    for line in content.lines() {
        let Some(record) = record::decode_line(line) else {
            continue;
        };

        if let (Some(cutoff), Some(ts)) = (cutoff, record.timestamp)
            && ts < cutoff
        {
            continue;
        }

        if let Some(ts) = record.timestamp {
            first_timestamp = Some(first_timestamp.map_or(ts, |first| first.min(ts)));
            last_timestamp = Some(last_timestamp.map_or(ts, |last| last.max(ts)));
        }

        if let Some(id) = &record.session_id {
            session_ids.insert(id.clone());
        }

        message_count += 1;
        tokens += record.tokens;
        estimated_cost += record.cost;
    }

    UsageSummary {
        tokens,
        estimated_cost,
        session_count: session_ids.len(),
        message_count,
        first_timestamp,
        last_updated: last_timestamp.unwrap_or_else(Utc::now),
    }
}
