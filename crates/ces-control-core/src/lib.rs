#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// Generated gRPC bindings for the `cescontrol` protobuf package.
pub mod proto {
    tonic::include_proto!("cescontrol");

    /// Encoded file descriptor set for gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("cescontrol_descriptor");
}
