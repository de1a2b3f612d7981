//! Historical log retrieval for dogus.
//!
//! The log aggregation backend only answers bounded, time-windowed queries,
//! so retrieval is a backward pagination: [`query`] walks fixed-width windows
//! from now towards older data, [`dedup`] collapses the duplicates that
//! overlapping window boundaries produce, and [`loki`] binds both to the HTTP
//! query endpoint.

pub mod dedup;
pub mod loki;
pub mod query;

use ces_control_core::Result;
use chrono::{DateTime, Utc};

/// A single log line as recorded by the log backend.
///
/// Two lines are considered the same entry only when both the timestamp and
/// the value match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Nanosecond-precision instant the backend attached to the line.
    pub timestamp: DateTime<Utc>,
    /// Raw line content, treated as opaque.
    pub value: String,
}

/// Capability of delivering historical log lines for a named dogu.
///
/// Implementations are substitutable with an in-memory fake in tests.
#[async_trait::async_trait]
pub trait LogProvider: Send + Sync {
    /// Returns up to `max_lines` most recent lines for `dogu_name`, oldest
    /// first. A non-positive `max_lines` requests all available lines.
    /// Returning fewer lines than requested is not an error.
    async fn get_logs(&self, dogu_name: &str, max_lines: i64) -> Result<Vec<LogLine>>;
}
