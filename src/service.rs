//! Aggregation service
//!
//! Long-lived orchestrator over the other modules: it refreshes the three
//! horizon summaries (day, week, month) from the discovered log files,
//! derives the current session window, flips an activity flag, and
//! publishes the result as a state bundle through a `tokio::sync::watch`
//! channel that the presentation layer subscribes to.
//!
//! Refreshes are triggered three ways: explicitly via [`UsageService::refresh`],
//! on a periodic timer, and by debounced filesystem notifications. Only
//! one refresh body runs at a time; re-entrant requests queue behind the
//! current one. Publication is latest-wins: results stamped older than
//! the last published refresh are discarded, and a refresh that completes
//! after [`UsageService::stop`] is never published.

use crate::error::{CcwatchError, Result};
use crate::file_aggregator::aggregate_file;
use crate::plan::Settings;
use crate::sources::SourceEnumerator;
use crate::types::UsageSummary;
use crate::watcher::ChangeWatcher;
use crate::window::{SessionWindow, compute_window};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

/// Service tuning knobs
///
/// An empty `roots` list means "discover the default roots".
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base directories to scan and watch
    pub roots: Vec<PathBuf>,
    /// Periodic refresh cadence
    pub refresh_interval: Duration,
    /// Quiescence window for change-triggered refreshes
    pub debounce: Duration,
    /// Cadence of the standalone activity check
    pub activity_interval: Duration,
    /// How recent a file modification counts as activity
    pub activity_threshold: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            refresh_interval: Duration::from_secs(300),
            debounce: Duration::from_secs(2),
            activity_interval: Duration::from_secs(3),
            activity_threshold: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    /// Derive a config from user settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            refresh_interval: settings.refresh_interval(),
            ..Self::default()
        }
    }
}

/// The published state bundle
///
/// Read-only from the consumer side; written exclusively by the refresh
/// algorithm and the activity check.
#[derive(Debug, Clone, Serialize)]
pub struct UsageState {
    /// Usage since the start of today
    pub today: UsageSummary,
    /// Usage since the start of the current ISO week
    pub this_week: UsageSummary,
    /// Usage since the start of the current month
    pub this_month: UsageSummary,
    /// Current 5-hour session window, if there was activity today
    pub window: Option<SessionWindow>,
    /// Whether a refresh is in flight
    pub is_loading: bool,
    /// User-visible condition, e.g. no data found
    pub error: Option<String>,
    /// Whether a log file was modified recently
    pub is_active: bool,
    /// Completion time of the last successful refresh
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Default for UsageState {
    fn default() -> Self {
        Self {
            today: UsageSummary::empty(),
            this_week: UsageSummary::empty(),
            this_month: UsageSummary::empty(),
            window: None,
            is_loading: false,
            error: None,
            is_active: false,
            last_refresh: None,
        }
    }
}

/// The usage aggregation engine
///
/// Cheap to clone; all clones share one underlying service. See the
/// crate-level docs for a usage example.
#[derive(Clone)]
pub struct UsageService {
    inner: Arc<Inner>,
}

struct Inner {
    config: ServiceConfig,
    sources: SourceEnumerator,
    state: watch::Sender<UsageState>,
    /// Serializes refresh bodies; re-entrant requests queue here
    refresh_gate: tokio::sync::Mutex<()>,
    /// Stamp of the last published refresh, for latest-wins publication
    last_published: Mutex<Option<DateTime<Utc>>>,
    /// Pending trailing-edge debounce task, if any
    debounce: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    watchers: Mutex<Vec<ChangeWatcher>>,
    stopped: AtomicBool,
}

/// Result of one successful refresh pass
struct Refreshed {
    today: UsageSummary,
    this_week: UsageSummary,
    this_month: UsageSummary,
    window: Option<SessionWindow>,
}

impl UsageService {
    /// Create a service; no background work starts until [`start`](Self::start)
    pub fn new(config: ServiceConfig) -> Self {
        let sources = if config.roots.is_empty() {
            SourceEnumerator::new()
        } else {
            SourceEnumerator::with_roots(config.roots.clone())
        };

        let (state, _) = watch::channel(UsageState::default());

        Self {
            inner: Arc::new(Inner {
                config,
                sources,
                state,
                refresh_gate: tokio::sync::Mutex::new(()),
                last_published: Mutex::new(None),
                debounce: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
                watchers: Mutex::new(Vec::new()),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// Create a service configured from user settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(ServiceConfig::from_settings(settings))
    }

    /// Subscribe to state updates
    pub fn subscribe(&self) -> watch::Receiver<UsageState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> UsageState {
        self.inner.state.borrow().clone()
    }

    /// Start monitoring: initial refresh, change watchers, and timers
    ///
    /// Must be called from within a tokio runtime. No-op if already
    /// started.
    pub fn start(&self) {
        let mut tasks = self.inner.tasks.lock().unwrap();
        if !tasks.is_empty() {
            return;
        }
        self.inner.stopped.store(false, Ordering::Release);

        let service = self.clone();
        tasks.push(tokio::spawn(async move {
            service.refresh().await;
        }));

        let service = self.clone();
        let period = self.inner.config.refresh_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the initial refresh
            // already covers it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.refresh().await;
            }
        }));

        let service = self.clone();
        let period = self.inner.config.activity_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.check_activity().await;
            }
        }));

        let mut watchers = self.inner.watchers.lock().unwrap();
        for root in self.inner.sources.roots() {
            let mut watcher = ChangeWatcher::new();
            let service = self.clone();
            watcher.watch(root, move || service.notify_change());
            watchers.push(watcher);
        }
    }

    /// Stop monitoring and release all native handles
    ///
    /// A refresh already in flight is abandoned: its result will not be
    /// published.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);

        for task in self.inner.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        if let Some(debounce) = self.inner.debounce.lock().unwrap().take() {
            debounce.abort();
        }

        let mut watchers = self.inner.watchers.lock().unwrap();
        for watcher in watchers.iter_mut() {
            watcher.stop();
        }
        watchers.clear();
    }

    /// Run one full refresh and publish the result
    ///
    /// Callable directly for manual refresh requests; also invoked by the
    /// periodic timer and the debounced change handler.
    pub async fn refresh(&self) {
        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }
        let _gate = self.inner.refresh_gate.lock().await;
        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }

        self.inner.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let now = Utc::now();
        let outcome = self.run_refresh(now).await;

        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }

        match outcome {
            Ok(refreshed) => {
                {
                    let mut last = self.inner.last_published.lock().unwrap();
                    if last.is_some_and(|prev| prev > now) {
                        debug!("discarding refresh results older than published state");
                        self.inner.state.send_modify(|s| s.is_loading = false);
                        return;
                    }
                    *last = Some(now);
                }

                debug!(
                    "refresh complete: {} tokens today, {} this month",
                    refreshed.today.total_tokens(),
                    refreshed.this_month.total_tokens()
                );
                self.inner.state.send_modify(|s| {
                    s.today = refreshed.today;
                    s.this_week = refreshed.this_week;
                    s.this_month = refreshed.this_month;
                    s.window = refreshed.window;
                    s.last_refresh = Some(now);
                    s.is_loading = false;
                    s.error = None;
                });

                self.check_activity().await;
            }
            Err(e) => {
                warn!("refresh failed: {e}");
                self.inner.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
            }
        }
    }

    /// Signal that watched content changed
    ///
    /// Marks activity immediately, then (re)starts the trailing-edge
    /// debounce timer: a burst of notifications yields exactly one
    /// refresh, one debounce interval after the burst settles.
    pub fn notify_change(&self) {
        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }

        self.inner.state.send_if_modified(|s| {
            if s.is_active {
                false
            } else {
                s.is_active = true;
                true
            }
        });

        let service = self.clone();
        let delay = self.inner.config.debounce;
        let mut debounce = self.inner.debounce.lock().unwrap();
        if let Some(pending) = debounce.take() {
            pending.abort();
        }
        *debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            service.refresh().await;
        }));
    }

    async fn run_refresh(&self, now: DateTime<Utc>) -> Result<Refreshed> {
        let cutoffs = horizon_cutoffs(Local::now());
        let files = self.inner.sources.find_log_files().await;

        if files.is_empty() {
            return Err(CcwatchError::NoUsageData);
        }

        let mut today = UsageSummary::empty();
        let mut this_week = UsageSummary::empty();
        let mut this_month = UsageSummary::empty();

        for file in &files {
            // A file untouched this month cannot contain this month's data.
            if file.modified < cutoffs.month {
                continue;
            }

            this_month = this_month + aggregate_file(&file.path, Some(cutoffs.month)).await;
            this_week = this_week + aggregate_file(&file.path, Some(cutoffs.week)).await;
            today = today + aggregate_file(&file.path, Some(cutoffs.day)).await;
        }

        let window = compute_window(&today, now);

        Ok(Refreshed {
            today,
            this_week,
            this_month,
            window,
        })
    }

    /// Flip the activity flag based on recent file modifications
    ///
    /// Flag-only: never touches aggregated totals.
    async fn check_activity(&self) {
        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }

        let files = self.inner.sources.find_log_files().await;
        let now = Utc::now();
        let threshold = chrono::Duration::from_std(self.inner.config.activity_threshold)
            .unwrap_or_else(|_| chrono::Duration::seconds(30));

        let active = files
            .iter()
            .any(|f| now.signed_duration_since(f.modified) < threshold);

        self.inner.state.send_if_modified(|s| {
            if s.is_active == active {
                false
            } else {
                s.is_active = active;
                true
            }
        });
    }
}

/// Lower bounds for the three aggregation horizons, as UTC instants
#[derive(Debug, Clone, Copy, PartialEq)]
struct HorizonCutoffs {
    day: DateTime<Utc>,
    week: DateTime<Utc>,
    month: DateTime<Utc>,
}

/// Compute the horizon cutoffs for the calendar `now` lives in
///
/// Day: local midnight today. Week: local midnight on the ISO week's
/// Monday. Month: local midnight on the first of the month.
fn horizon_cutoffs<Tz: TimeZone>(now: DateTime<Tz>) -> HorizonCutoffs {
    let today = now.date_naive();
    let week_start = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
    let month_start = today.with_day(1).unwrap_or(today);

    HorizonCutoffs {
        day: local_midnight(&now, today),
        week: local_midnight(&now, week_start),
        month: local_midnight(&now, month_start),
    }
}

fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // Midnight skipped by a DST transition; fall back to the current
        // instant rather than guessing.
        None => now.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_cutoffs_mid_week() {
        // 2025-06-18 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2025, 6, 18, 15, 30, 0).unwrap();
        let cutoffs = horizon_cutoffs(now);

        assert_eq!(cutoffs.day, Utc.with_ymd_and_hms(2025, 6, 18, 0, 0, 0).unwrap());
        assert_eq!(cutoffs.week, Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap());
        assert_eq!(cutoffs.month, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_horizon_cutoffs_week_crosses_month_boundary() {
        // 2025-03-01 is a Saturday; its ISO week began Monday 2025-02-24.
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let cutoffs = horizon_cutoffs(now);

        assert_eq!(cutoffs.week, Utc.with_ymd_and_hms(2025, 2, 24, 0, 0, 0).unwrap());
        assert_eq!(cutoffs.month, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_horizon_cutoffs_on_monday() {
        // 2025-06-16 is a Monday: week cutoff is that same midnight.
        let now = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 1).unwrap();
        let cutoffs = horizon_cutoffs(now);

        assert_eq!(cutoffs.day, cutoffs.week);
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.debounce, Duration::from_secs(2));
        assert_eq!(config.activity_interval, Duration::from_secs(3));
        assert_eq!(config.activity_threshold, Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            refresh_interval_secs: 60,
            ..Settings::default()
        };
        let config = ServiceConfig::from_settings(&settings);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.debounce, Duration::from_secs(2));
    }
}
