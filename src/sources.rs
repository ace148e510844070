//! Discovery of usage log files
//!
//! Transcript files live under two configuration roots, one level of
//! project subdirectories deep: `<root>/<project>/<session>.jsonl`.
//! Discovery is best-effort: missing roots, unreadable subdirectories, and
//! entries that are not project directories are silently skipped, since
//! partial layouts are the normal case rather than an error.
//!
//! The default roots are `~/.claude/projects` and
//! `~/.config/claude/projects`. The `CCWATCH_DATA_PATH` environment
//! variable overrides discovery with a single root.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::debug;

/// Recognized transcript extension
const LOG_EXTENSION: &str = "jsonl";

/// One discovered log file and its modification time
#[derive(Debug, Clone)]
pub struct LogFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Filesystem modification time
    pub modified: DateTime<Utc>,
}

/// Enumerates log files under the configured roots
#[derive(Debug, Clone)]
pub struct SourceEnumerator {
    roots: Vec<PathBuf>,
}

impl SourceEnumerator {
    /// Create an enumerator over the default roots
    pub fn new() -> Self {
        Self {
            roots: default_roots(),
        }
    }

    /// Create an enumerator over explicit roots
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// The configured root directories
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find all log files, one project level below each root
    ///
    /// No ordering guarantee; callers must not depend on the order.
    pub async fn find_log_files(&self) -> Vec<LogFile> {
        let mut files = Vec::new();

        for root in &self.roots {
            let Ok(mut projects) = tokio::fs::read_dir(root).await else {
                continue;
            };

            while let Ok(Some(project)) = projects.next_entry().await {
                let Ok(file_type) = project.file_type().await else {
                    continue;
                };
                if !file_type.is_dir() {
                    continue;
                }

                let Ok(mut entries) = tokio::fs::read_dir(project.path()).await else {
                    continue;
                };

                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    if path.extension().and_then(|s| s.to_str()) != Some(LOG_EXTENSION) {
                        continue;
                    }
                    let Ok(metadata) = entry.metadata().await else {
                        continue;
                    };
                    let Ok(modified) = metadata.modified() else {
                        continue;
                    };
                    files.push(LogFile {
                        path,
                        modified: modified.into(),
                    });
                }
            }
        }

        debug!("found {} usage log files", files.len());
        files
    }
}

impl Default for SourceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

fn default_roots() -> Vec<PathBuf> {
    if let Ok(custom) = std::env::var("CCWATCH_DATA_PATH") {
        return vec![PathBuf::from(custom)];
    }

    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".claude/projects"));
        roots.push(home.join(".config/claude/projects"));
    }
    roots
}
