//! Error types for the log retrieval service.
//!
//! This module defines the central `Error` enum, which captures all
//! reportable error cases within the log retrieval pipeline. It implements
//! `From<Error>` for `tonic::Status` to enable seamless gRPC error
//! propagation to clients with appropriate status codes and messages.
//!
//! ## Error Cases
//! - `InvalidRequest`: The client request was malformed (no network call is
//!   made).
//! - `QueryConstruction`: A backend query could not be built (e.g. malformed
//!   base URL); aborts before any network I/O.
//! - `Transport`: The HTTP request to the log backend failed.
//! - `BackendProtocol`: The backend answered outside its contract (non-2xx
//!   status, unexpected envelope fields, unparseable timestamps). The message
//!   names the offending raw value.
//! - `Decode`: The backend response body was not valid JSON.
//! - `ChannelError`: An internal communication failure while streaming the
//!   response to the client.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the log retrieval service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The client request was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A backend query could not be constructed; no network call was made.
    #[error("Query construction failed: {context}")]
    QueryConstruction { context: String },

    /// The HTTP request to the log backend failed at the network level.
    #[error("Transport error: {context}")]
    Transport { context: String },

    /// The log backend violated its response contract.
    #[error("Backend protocol error: {context}")]
    BackendProtocol { context: String },

    /// The backend response body could not be decoded.
    #[error("Decode error: {context}")]
    Decode { context: String },

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::QueryConstruction { context } => {
                Status::internal(format!("Query construction failed: {}", context))
            }
            Error::Transport { context } => {
                Status::unavailable(format!("Log backend unreachable: {}", context))
            }
            Error::BackendProtocol { context } => {
                Status::internal(format!("Log backend protocol error: {}", context))
            }
            Error::Decode { context } => {
                Status::internal(format!("Log backend decode error: {}", context))
            }
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
        }
    }
}
