//! Backward pagination over a time-windowed log store.
//!
//! The backend answers at most one page of lines per query and only within a
//! bounded time window, so retrieving "the N most recent lines" without
//! knowing the total volume walks fixed-width windows from now towards older
//! data. Each round queries `[end - lookback, end]`, folds the batch into the
//! front of the accumulator, and moves `end` to the oldest timestamp seen.
//!
//! The loop is deliberately iterative with explicit exit predicates (empty
//! batch, short batch, target reached) so pathological log volumes cannot
//! grow the stack.

use super::LogLine;
use ces_control_core::Result;
use chrono::{DateTime, Duration, Utc};

/// One round of a backward range query against the log backend.
#[async_trait::async_trait]
pub trait RangeQuery: Send + Sync {
    /// Returns the `limit` most recent lines whose pods match `selector`
    /// within the inclusive window `[start, end]`, re-sorted ascending by
    /// timestamp (stable among equal timestamps).
    async fn query_range(
        &self,
        selector: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LogLine>>;
}

/// Computes the line limit for the next pagination round.
///
/// A non-positive `max_lines` requests everything, so every round uses the
/// full page cap. Otherwise the limit is the number of lines still missing,
/// capped at `page_cap`. A result of `0` means the target is already met and
/// the caller must not issue another query.
pub fn next_page_limit(max_lines: i64, collected: usize, page_cap: usize) -> usize {
    if max_lines <= 0 {
        return page_cap;
    }
    (max_lines as usize).saturating_sub(collected).min(page_cap)
}

/// Collects up to `max_lines` most recent lines for `selector`, oldest first.
///
/// Batches arrive progressively older and are prepended to the accumulator.
/// The loop stops when a round comes back empty (no earlier data exists),
/// when a round returns fewer lines than its limit (the window is
/// exhausted), or when the requested line count is reached. A short result
/// is not an error.
///
/// Any query failure aborts the whole retrieval; partial accumulation is
/// discarded.
pub async fn collect_recent<Q>(
    backend: &Q,
    selector: &str,
    max_lines: i64,
    page_cap: usize,
    lookback: Duration,
) -> Result<Vec<LogLine>>
where
    Q: RangeQuery + ?Sized,
{
    let mut lines: Vec<LogLine> = Vec::new();
    let mut end = Utc::now();

    loop {
        let limit = next_page_limit(max_lines, lines.len(), page_cap);
        if limit == 0 {
            break;
        }

        let start = end - lookback;
        let batch = backend.query_range(selector, start, end, limit).await?;
        if batch.is_empty() {
            break;
        }

        let batch_len = batch.len();
        // Batches are sorted ascending, so the oldest line comes first.
        let oldest = batch[0].timestamp;

        let mut merged = batch;
        merged.append(&mut lines);
        lines = merged;

        if batch_len < limit {
            break;
        }
        if max_lines > 0 && lines.len() >= max_lines as usize {
            break;
        }

        // Requery strictly older data. The boundary instant itself may hold
        // more lines than fit into one page, so windows can overlap there;
        // the resulting duplicates are collapsed by the caller.
        end = oldest;
    }

    Ok(lines)
}
