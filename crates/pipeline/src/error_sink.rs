//! Append-only text file for audit writes that failed.
//!
//! A failed traffic-log or alert insert does not fail the request; the row
//! that could not be written is kept here so it can be replayed by hand.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct ErrorSink {
    path: PathBuf,
}

impl ErrorSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Errors writing the sink itself are only logged.
    pub async fn record<P: Serialize>(&self, context: &str, error: &(dyn Display + Sync), payload: &P) {
        let payload =
            serde_json::to_string(payload).unwrap_or_else(|e| format!("<unserializable: {e}>"));
        let entry = format!(
            "\n[{}] {context}: {error}\nPayload: {payload}\n",
            Utc::now().to_rfc3339()
        );

        if let Err(e) = self.append(entry.as_bytes()).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Could not write to error sink"
            );
        }
    }

    async fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path().join("db_errors.txt"));

        sink.record("Log Insert Error", &"connection reset", &json!({"video_id": 1})).await;
        sink.record("Alert Insert Error", &"timeout", &json!({"video_id": 2})).await;

        let text = std::fs::read_to_string(sink.path()).unwrap();
        assert!(text.contains("Log Insert Error: connection reset\nPayload: {\"video_id\":1}"));
        assert!(text.contains("Alert Insert Error: timeout"));
        assert_eq!(text.matches("Payload:").count(), 2);
    }

    #[tokio::test]
    async fn unwritable_sink_does_not_panic() {
        let sink = ErrorSink::new("/nonexistent-dir/db_errors.txt");
        sink.record("Log Insert Error", &"boom", &json!({})).await;
    }
}
