//! Outcome log for processed webhooks.
//!
//! Every processed request becomes one JSON line, emitted through tracing and
//! optionally appended to a file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::types::{ScriptResponse, TransformLog, TransformOutcome};

/// Writes [`TransformLog`] entries as JSON lines.
pub struct TransformLogger {
    log_path: Option<PathBuf>,
    counts: RwLock<OutcomeCounts>,
}

/// Running totals per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub posted: u64,
    pub suppressed: u64,
    pub errors: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.posted + self.suppressed + self.errors
    }
}

impl TransformLogger {
    /// Create a logger that also appends to the given file path.
    /// If `None`, entries only go to tracing output.
    pub fn new(log_path: Option<PathBuf>) -> Self {
        Self {
            log_path,
            counts: RwLock::new(OutcomeCounts::default()),
        }
    }

    /// Count the outcome, emit it as a tracing event and append it to the
    /// log file when one is configured.
    pub async fn log(&self, entry: &TransformLog) {
        self.tally(entry.outcome).await;

        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "transform log entry not serializable");
                return;
            }
        };

        let event = entry.event.as_deref().unwrap_or_default();
        let issue = entry.issue_key.as_deref().unwrap_or_default();
        match &entry.error {
            Some(error) => tracing::warn!(target: "jira_relay", event, issue, error = %error, "{}", line),
            None => tracing::info!(target: "jira_relay", event, issue, "{}", line),
        }

        if let Some(path) = &self.log_path {
            if let Err(e) = append_line(path, &line).await {
                tracing::warn!(path = %path.display(), error = %e, "transform log not written");
            }
        }
    }

    async fn tally(&self, outcome: TransformOutcome) {
        let mut counts = self.counts.write().await;
        let slot = match outcome {
            TransformOutcome::Posted => &mut counts.posted,
            TransformOutcome::Suppressed => &mut counts.suppressed,
            TransformOutcome::Error => &mut counts.errors,
        };
        *slot += 1;
    }

    /// Build an entry for a finished transform.
    pub fn entry(
        event: Option<&str>,
        issue_key: Option<&str>,
        response: &ScriptResponse,
        elapsed: Duration,
    ) -> TransformLog {
        TransformLog {
            ts: Utc::now(),
            event: event.map(str::to_string),
            issue_key: issue_key.map(str::to_string),
            outcome: response.outcome(),
            channel: response.message().and_then(|m| m.channel.clone()),
            duration_us: u64::try_from(elapsed.as_micros()).ok(),
            error: response.error().map(|e| e.message.clone()),
        }
    }

    pub async fn counts(&self) -> OutcomeCounts {
        *self.counts.read().await
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(format!("{}\n", line).as_bytes()).await
}
