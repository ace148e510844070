//! Common test utilities for ccwatch tests
//!
//! Provides a builder for transcript lines in the on-disk JSONL shape and
//! helpers to lay out temp data directories with the expected
//! root/project/file structure.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Initialize tracing once for the whole test binary
#[allow(dead_code)]
pub static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
});

/// Builder for raw transcript lines
pub struct LogLineBuilder {
    entry_type: String,
    session_id: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    model: Option<String>,
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_tokens: u64,
    cache_read_tokens: u64,
}

impl LogLineBuilder {
    pub fn new() -> Self {
        Self {
            entry_type: "assistant".to_string(),
            session_id: Some("test-session".to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()),
            model: Some("claude-sonnet-4".to_string()),
            input_tokens: 100,
            output_tokens: 50,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
        }
    }

    #[allow(dead_code)]
    pub fn with_type(mut self, entry_type: &str) -> Self {
        self.entry_type = entry_type.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn with_session_id(mut self, id: &str) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    #[allow(dead_code)]
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    #[allow(dead_code)]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    #[allow(dead_code)]
    pub fn with_cache_tokens(mut self, creation: u64, read: u64) -> Self {
        self.cache_creation_tokens = creation;
        self.cache_read_tokens = read;
        self
    }

    /// Render as one JSONL line
    pub fn to_jsonl(self) -> String {
        let session_field = self
            .session_id
            .map(|id| format!(r#""sessionId":"{id}","#))
            .unwrap_or_default();
        let timestamp_field = self
            .timestamp
            .map(|ts| format!(r#""timestamp":"{}","#, ts.to_rfc3339()))
            .unwrap_or_default();
        let model_field = self
            .model
            .map(|m| format!(r#""model":"{m}","#))
            .unwrap_or_default();

        format!(
            r#"{{{session_field}{timestamp_field}"type":"{}","message":{{{model_field}"usage":{{"input_tokens":{},"output_tokens":{},"cache_creation_input_tokens":{},"cache_read_input_tokens":{}}}}}}}"#,
            self.entry_type,
            self.input_tokens,
            self.output_tokens,
            self.cache_creation_tokens,
            self.cache_read_tokens,
        )
    }
}

impl Default for LogLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a transcript file under `<root>/<project>/<file>` and return its path
pub fn write_log(root: &Path, project: &str, file: &str, lines: &[String]) -> PathBuf {
    let project_dir = root.join(project);
    std::fs::create_dir_all(&project_dir).unwrap();

    let path = project_dir.join(file);
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&path, content).unwrap();
    path
}
