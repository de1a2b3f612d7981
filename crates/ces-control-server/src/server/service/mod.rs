//! gRPC service implementation.
//!
//! This module contains the client-facing gRPC handlers. Each request runs a
//! strictly linear pipeline: validate, retrieve, serialize, chunk-send.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`LogMessageService`).

pub mod handler;
