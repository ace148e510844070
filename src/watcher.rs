//! Filesystem change watcher
//!
//! One `ChangeWatcher` instance subscribes to a single directory and
//! invokes its callback whenever a transcript file under it is created,
//! modified, or removed. The callback runs on a tokio task fed by a
//! channel, never on the notification backend's delivery thread.
//!
//! A failed subscription (typically a path that does not exist yet) is
//! logged and leaves the watcher idle: each configured root is watched
//! independently, and one missing root must not block the others.

use crate::error::{CcwatchError, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Watches one directory for transcript changes
pub struct ChangeWatcher {
    active: Option<WatchGuard>,
}

/// Live subscription state; dropping it releases the native watch handle
struct WatchGuard {
    _watcher: RecommendedWatcher,
    forward: tokio::task::JoinHandle<()>,
}

impl ChangeWatcher {
    /// Create an idle watcher
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Whether a subscription is currently active
    pub fn is_watching(&self) -> bool {
        self.active.is_some()
    }

    /// Start watching `path`, invoking `on_change` on relevant events
    ///
    /// No-op when already watching. Must be called from within a tokio
    /// runtime. Subscription failures are logged; the watcher stays idle.
    pub fn watch<F>(&mut self, path: &Path, on_change: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.active.is_some() {
            return;
        }

        match Self::open_subscription(path) {
            Ok((watcher, mut rx)) => {
                let forward = tokio::spawn(async move {
                    while rx.recv().await.is_some() {
                        on_change();
                    }
                });
                debug!("watching {}", path.display());
                self.active = Some(WatchGuard {
                    _watcher: watcher,
                    forward,
                });
            }
            Err(e) => {
                warn!("failed to watch {}: {e}", path.display());
            }
        }
    }

    /// Cancel the subscription and release the native handle
    ///
    /// Harmless no-op when not watching.
    pub fn stop(&mut self) {
        if let Some(guard) = self.active.take() {
            guard.forward.abort();
        }
    }

    fn open_subscription(
        path: &Path,
    ) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                if let Ok(event) = result
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    for path in &event.paths {
                        if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                            let _ = tx.send(());
                            break;
                        }
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| CcwatchError::Watch(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| CcwatchError::Watch(format!("{}: {e}", path.display())))?;

        Ok((watcher, rx))
    }
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
