//! Error types for ccwatch
//!
//! This module defines the error types used throughout the ccwatch library.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Most failure modes in the aggregation engine are absorbed locally
//! (a malformed line, an unreadable file, a missing directory) and never
//! reach this type; the variants below cover the conditions that do
//! propagate or get surfaced to the published state.

use thiserror::Error;

/// Main error type for ccwatch operations
#[derive(Error, Debug)]
pub enum CcwatchError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// No usage log files found under the configured roots
    #[error("No Claude Code usage data found")]
    NoUsageData,

    /// Filesystem watch subscription failed
    #[error("Watch error: {0}")]
    Watch(String),
}

/// Convenience type alias for Results in ccwatch
pub type Result<T> = std::result::Result<T, CcwatchError>;
