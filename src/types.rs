//! Core domain types for ccwatch
//!
//! This module contains the fundamental value types used throughout the
//! library: per-record token breakdowns, decoded usage records, and the
//! period summaries that refreshes fold files into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Token counts for usage tracking
///
/// Tracks all four token categories reported per assistant response:
/// input, output, and the two cache-related categories.
///
/// # Examples
/// ```
/// use ccwatch::types::TokenCounts;
///
/// let tokens = TokenCounts::new(100, 50, 10, 5);
/// assert_eq!(tokens.total(), 165);
///
/// let combined = tokens + TokenCounts::new(50, 25, 5, 2);
/// assert_eq!(combined.input_tokens, 150);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    /// Input tokens used
    pub input_tokens: u64,
    /// Output tokens generated
    pub output_tokens: u64,
    /// Cache creation tokens
    pub cache_creation_tokens: u64,
    /// Cache read tokens
    pub cache_read_tokens: u64,
}

impl TokenCounts {
    /// Create new TokenCounts
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_tokens: u64,
        cache_read_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_tokens,
            cache_read_tokens,
        }
    }

    /// Calculate total tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}

impl Add for TokenCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            cache_creation_tokens: self.cache_creation_tokens + other.cache_creation_tokens,
            cache_read_tokens: self.cache_read_tokens + other.cache_read_tokens,
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
    }
}

/// A single decoded usage record from one JSONL line
///
/// Ephemeral: produced by the record decoder and immediately folded into a
/// [`UsageSummary`]. Every field except the token breakdown is optional
/// because transcript lines routinely omit them.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    /// Model identifier, when the message carried one
    pub model: Option<String>,
    /// Session identifier, when present
    pub session_id: Option<String>,
    /// Record timestamp, when present and parseable
    pub timestamp: Option<DateTime<Utc>>,
    /// Token breakdown for this response
    pub tokens: TokenCounts,
    /// Estimated cost in USD for this response
    pub cost: f64,
}

/// Aggregated usage over one period
///
/// Summaries are immutable values: each refresh constructs fresh ones per
/// file, combines them per horizon with `+`, and replaces the previous
/// in-memory summary. Combination is associative and commutative on every
/// additive field; [`UsageSummary::empty`] is the additive identity.
///
/// # Examples
/// ```
/// use ccwatch::types::{TokenCounts, UsageSummary};
///
/// let a = UsageSummary {
///     tokens: TokenCounts::new(1000, 500, 0, 0),
///     message_count: 1,
///     ..UsageSummary::empty()
/// };
/// let combined = a.clone() + UsageSummary::empty();
/// assert_eq!(combined.total_tokens(), a.total_tokens());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Total token counts for the period
    pub tokens: TokenCounts,
    /// Accumulated estimated cost in USD
    pub estimated_cost: f64,
    /// Number of distinct sessions seen
    pub session_count: usize,
    /// Number of priced assistant responses seen
    pub message_count: usize,
    /// Earliest record timestamp seen, if any record carried one
    pub first_timestamp: Option<DateTime<Utc>>,
    /// Latest record timestamp seen, or the construction time when none was
    pub last_updated: DateTime<Utc>,
}

impl UsageSummary {
    /// The additive identity: no tokens, no cost, no records
    pub fn empty() -> Self {
        Self {
            tokens: TokenCounts::default(),
            estimated_cost: 0.0,
            session_count: 0,
            message_count: 0,
            first_timestamp: None,
            last_updated: Utc::now(),
        }
    }

    /// Total tokens across all four categories
    pub fn total_tokens(&self) -> u64 {
        self.tokens.total()
    }
}

impl Default for UsageSummary {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for UsageSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let first_timestamp = match (self.first_timestamp, other.first_timestamp) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        Self {
            tokens: self.tokens + other.tokens,
            estimated_cost: self.estimated_cost + other.estimated_cost,
            session_count: self.session_count + other.session_count,
            message_count: self.message_count + other.message_count,
            first_timestamp,
            last_updated: self.last_updated.max(other.last_updated),
        }
    }
}
