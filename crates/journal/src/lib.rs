//! Journal - append-only JSONL storage
//!
//! Two layers live here:
//! - [`Journal`]: a thread-safe JSONL file that any serde record can be appended to
//! - [`DaemonLog`]: structured daemon log entries on top of a journal, mirrored to `tracing`

pub mod daemon_log;
pub mod store;

pub use daemon_log::{DaemonLog, Level, LogContext, LogEntry};
pub use store::Journal;
