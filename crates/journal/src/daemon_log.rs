//! Structured daemon logs stored in a journal
//!
//! Entries are persisted as JSONL and mirrored to `tracing` so that a running
//! server can both print its activity and serve it back over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::store::Journal;

// Types
// =====

/// Severity of a daemon log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "success",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Request context attached to entries produced while serving HTTP
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  /// Request ID for correlation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  /// HTTP method
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  /// Request path
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  /// User agent
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_agent: Option<String>,

  /// Request duration in milliseconds
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,

  /// HTTP status code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
}

/// A single persisted log line
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: Level,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

/// Disk-backed daemon log with optional console mirroring
#[derive(Clone)]
pub struct DaemonLog {
  journal: Journal,
  silent: bool,
}

// Core API
// ========

impl DaemonLog {
  /// Open a daemon log that mirrors every entry to `tracing`
  pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    Self::open_with_silent(path, false)
  }

  /// Open a daemon log, optionally suppressing the `tracing` mirror
  pub fn open_with_silent<P: AsRef<Path>>(path: P, silent: bool) -> std::io::Result<Self> {
    Ok(Self { journal: Journal::open(path)?, silent })
  }

  /// Persist an entry and mirror it; storage failures are reported but never propagated
  pub async fn log(&self, level: Level, message: &str, component: &str, context: Option<LogContext>) {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level,
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    if let Err(e) = self.journal.append(&entry).await {
      tracing::warn!(component, "failed to persist daemon log entry: {e}");
    }

    if !self.silent {
      mirror(&entry);
    }
  }

  /// Most recent `limit` entries (oldest first), optionally filtered by level
  ///
  /// A `level_filter` of `"all"` or `None` matches every entry.
  pub async fn entries(
    &self,
    limit: Option<usize>,
    level_filter: Option<&str>,
  ) -> std::io::Result<Vec<LogEntry>> {
    let entries: Vec<LogEntry> = self
      .journal
      .read_all::<LogEntry>()
      .await?
      .into_iter()
      .filter(|entry| level_filter.is_none_or(|f| f == "all" || entry.level.as_str() == f))
      .collect();

    // Append order is chronological
    let skip = limit.map_or(0, |limit| entries.len().saturating_sub(limit));
    Ok(entries.into_iter().skip(skip).collect())
  }

  pub fn path(&self) -> &Path {
    self.journal.path()
  }
}

// Level Wrappers
// ==============

impl DaemonLog {
  pub async fn debug(&self, message: &str, component: &str) {
    self.log(Level::Debug, message, component, None).await;
  }

  pub async fn info(&self, message: &str, component: &str) {
    self.log(Level::Info, message, component, None).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    self.log(Level::Success, message, component, None).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    self.log(Level::Warn, message, component, None).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.log(Level::Error, message, component, None).await;
  }

  pub async fn info_with_context(&self, message: &str, component: &str, context: LogContext) {
    self.log(Level::Info, message, component, Some(context)).await;
  }

  pub async fn warn_with_context(&self, message: &str, component: &str, context: LogContext) {
    self.log(Level::Warn, message, component, Some(context)).await;
  }

  pub async fn error_with_context(&self, message: &str, component: &str, context: LogContext) {
    self.log(Level::Error, message, component, Some(context)).await;
  }
}

fn mirror(entry: &LogEntry) {
  let component = entry.component.as_str();
  let message = entry.message.as_str();
  match entry.level {
    Level::Debug => tracing::debug!(component, "{message}"),
    Level::Info | Level::Success => tracing::info!(component, "{message}"),
    Level::Warn => tracing::warn!(component, "{message}"),
    Level::Error => tracing::error!(component, "{message}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn open_silent(temp: &TempDir) -> DaemonLog {
    DaemonLog::open_with_silent(temp.path().join("daemon.logs.jsonl"), true).unwrap()
  }

  #[tokio::test]
  async fn test_entries_round_trip_levels_and_components() {
    let temp = TempDir::new().unwrap();
    let log = open_silent(&temp);

    log.info("server starting", "sasok-server").await;
    log.error("model missing", "emotion-detector").await;

    let entries = log.entries(None, None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, Level::Info);
    assert_eq!(entries[0].component, "sasok-server");
    assert_eq!(entries[1].level, Level::Error);
    assert_eq!(entries[1].message, "model missing");
  }

  #[tokio::test]
  async fn test_level_filter() {
    let temp = TempDir::new().unwrap();
    let log = open_silent(&temp);

    log.info("one", "test").await;
    log.warn("two", "test").await;
    log.warn("three", "test").await;

    let warnings = log.entries(None, Some("warn")).await.unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|e| e.level == Level::Warn));

    let all = log.entries(None, Some("all")).await.unwrap();
    assert_eq!(all.len(), 3);
  }

  #[tokio::test]
  async fn test_limit_keeps_newest_in_chronological_order() {
    let temp = TempDir::new().unwrap();
    let log = open_silent(&temp);

    for i in 0..5 {
      log.info(&format!("entry {i}"), "test").await;
      tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let entries = log.entries(Some(2), None).await.unwrap();
    let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["entry 3", "entry 4"]);
  }

  #[tokio::test]
  async fn test_limit_follows_file_order_for_equal_timestamps() {
    let temp = TempDir::new().unwrap();
    let log = open_silent(&temp);
    let timestamp = Utc::now();

    for i in 0..4 {
      let entry = LogEntry {
        timestamp,
        level: Level::Info,
        message: format!("entry {i}"),
        component: "test".to_string(),
        context: None,
      };
      log.journal.append(&entry).await.unwrap();
    }

    let entries = log.entries(Some(3), None).await.unwrap();
    let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["entry 1", "entry 2", "entry 3"]);
  }

  #[tokio::test]
  async fn test_context_is_persisted() {
    let temp = TempDir::new().unwrap();
    let log = open_silent(&temp);

    let context = LogContext {
      request_id: Some("abc".to_string()),
      method: Some("GET".to_string()),
      path: Some("/health".to_string()),
      status_code: Some(200),
      ..Default::default()
    };
    log.info_with_context("Request completed", "http-request", context).await;

    let entries = log.entries(None, None).await.unwrap();
    let context = entries[0].context.as_ref().unwrap();
    assert_eq!(context.path.as_deref(), Some("/health"));
    assert_eq!(context.status_code, Some(200));
    assert!(context.user_agent.is_none());
  }
}
