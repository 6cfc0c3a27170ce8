//! Thread-safe JSONL record storage

use serde::{de::DeserializeOwned, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Target path, held under the journal lock so appends and reads serialize
struct JournalInner {
  path: PathBuf,
}

/// Append-only JSONL file shared across tasks
///
/// Every record is serialized onto its own line. Reads skip blank and
/// malformed lines so a torn write never poisons the whole file.
#[derive(Clone)]
pub struct Journal {
  path: PathBuf,
  inner: Arc<tokio::sync::Mutex<JournalInner>>,
}

impl JournalInner {
  fn open(path: PathBuf) -> std::io::Result<Self> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    // Create without truncating existing content
    if !path.exists() {
      File::create(&path)?;
    }

    Ok(Self { path })
  }

  fn append<T: Serialize>(&mut self, record: &T) -> std::io::Result<()> {
    let line = serde_json::to_string(record)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    writeln!(file, "{line}")?;
    file.flush()
  }

  fn read_all<T: DeserializeOwned>(&self) -> std::io::Result<Vec<T>> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(&self.path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }

      match serde_json::from_str::<T>(&line) {
        Ok(record) => records.push(record),
        Err(e) => tracing::debug!(path = %self.path.display(), "skipping malformed journal line: {e}"),
      }
    }

    Ok(records)
  }

  fn count(&self) -> std::io::Result<usize> {
    if !self.path.exists() {
      return Ok(0);
    }

    let reader = BufReader::new(File::open(&self.path)?);
    let mut count = 0;
    for line in reader.lines() {
      if !line?.trim().is_empty() {
        count += 1;
      }
    }
    Ok(count)
  }
}

impl Journal {
  /// Open (or create) a journal at the given path
  pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    let path = path.as_ref().to_path_buf();
    let inner = JournalInner::open(path.clone())?;
    Ok(Self { path, inner: Arc::new(tokio::sync::Mutex::new(inner)) })
  }

  /// Append one record as a JSON line
  pub async fn append<T: Serialize>(&self, record: &T) -> std::io::Result<()> {
    let mut guard = self.inner.lock().await;
    guard.append(record)
  }

  /// Read every well-formed record in file order
  pub async fn read_all<T: DeserializeOwned>(&self) -> std::io::Result<Vec<T>> {
    let guard = self.inner.lock().await;
    guard.read_all()
  }

  /// Read the last `limit` well-formed records in file order
  pub async fn read_recent<T: DeserializeOwned>(&self, limit: usize) -> std::io::Result<Vec<T>> {
    let mut records = self.read_all().await?;
    if records.len() > limit {
      records.drain(..records.len() - limit);
    }
    Ok(records)
  }

  /// Number of non-empty lines, malformed ones included
  pub async fn len(&self) -> std::io::Result<usize> {
    let guard = self.inner.lock().await;
    guard.count()
  }

  pub async fn is_empty(&self) -> std::io::Result<bool> {
    Ok(self.len().await? == 0)
  }

  /// Location of the backing file
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Size of the backing file in bytes
  pub async fn file_size(&self) -> std::io::Result<u64> {
    let _guard = self.inner.lock().await;
    Ok(std::fs::metadata(&self.path)?.len())
  }
}
