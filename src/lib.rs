//! ccwatch - Track Claude Code usage from local JSONL transcript files
//!
//! This library provides a long-lived aggregation engine that:
//! - Discovers transcript files under the standard configuration roots
//! - Parses usage records tolerantly, one JSONL line at a time
//! - Aggregates tokens, cost, and message counts over day/week/month horizons
//! - Derives the rolling 5-hour session window, with rollover
//! - Watches the log directories and re-aggregates after changes settle
//!
//! The engine publishes its state through a watch channel; a presentation
//! layer (menu bar, status line, dashboard) subscribes and renders it.
//!
//! # Examples
//!
//! ```no_run
//! use ccwatch::service::{ServiceConfig, UsageService};
//!
//! # async fn example() {
//! let service = UsageService::new(ServiceConfig::default());
//! let mut updates = service.subscribe();
//!
//! service.start();
//!
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow().clone();
//!     if let Some(window) = &state.window {
//!         println!(
//!             "session window: {} tokens until {}",
//!             window.token_usage, window.end_time
//!         );
//!     }
//! }
//! # }
//! ```

pub mod error;
pub mod file_aggregator;
pub mod plan;
pub mod pricing;
pub mod record;
pub mod service;
pub mod sources;
pub mod types;
pub mod watcher;
pub mod window;

// Re-export commonly used types
pub use error::{CcwatchError, Result};
pub use plan::{PlanLimits, PlanType, Settings};
pub use service::{ServiceConfig, UsageService, UsageState};
pub use types::{TokenCounts, UsageRecord, UsageSummary};
pub use window::{SESSION_WINDOW_SECONDS, SessionWindow, compute_window};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
