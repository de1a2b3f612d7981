//! # Shared Log Retrieval Constants
//!
//! This module defines the constants shared between the client and server
//! sides of the chunked log transport. They form a compile-time contract:
//! a client reassembling a payload may rely on every frame being at most
//! [`DEFAULT_CHUNK_BYTES`] long.

/// Maximum number of payload bytes carried by a single
/// `ChunkedDataResponse` frame (64 KiB).
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// Maximum number of log lines a single backend query may request
/// (the page cap of the backward pagination).
pub const DEFAULT_QUERY_PAGE_LIMIT: usize = 1000;

/// Fixed width of one query's time window, in days. Each pagination round
/// looks at most this far back from its end date.
pub const LOOKBACK_DAYS: i64 = 30;
