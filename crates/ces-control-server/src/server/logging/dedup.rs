//! Removal of log lines duplicated across pagination rounds.
//!
//! Consecutive backward query windows share their boundary instant, so a line
//! fetched at the end of one round can reappear at the start of the next.
//! The working set lives only for the duration of one retrieval call.

use super::LogLine;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Collapses repeated (timestamp, value) pairs, keeping the first occurrence
/// of each and preserving the relative order of the kept lines.
///
/// Lines that share only a timestamp or only a value are distinct entries
/// and are never merged.
pub fn dedup_log_lines(lines: Vec<LogLine>) -> Vec<LogLine> {
    let mut seen: HashSet<(DateTime<Utc>, String)> = HashSet::with_capacity(lines.len());
    let mut kept = Vec::with_capacity(lines.len());

    for line in lines {
        if seen.insert((line.timestamp, line.value.clone())) {
            kept.push(line);
        }
    }

    kept
}
