//! Transport helpers for streaming large payloads to gRPC clients.
//!
//! ## Structure
//!
//! - [`chunked`] - fixed-size frame splitting over an abstract sink.

pub mod chunked;
