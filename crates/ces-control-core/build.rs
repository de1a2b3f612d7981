/// Builds the gRPC client and server code for the `cescontrol.proto`
/// definition using `tonic-prost-build`.
///
/// The `data` field of the `ChunkedDataResponse` message is explicitly marked
/// with `.bytes(...)` so it deserializes as `Bytes` instead of the default
/// `Vec<u8>`, which lets chunk frames be sliced out of the source payload
/// without copying.
///
/// A file descriptor set is written next to the generated code so the server
/// can register gRPC reflection.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("cescontrol_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();

    // Ensure the chunk payload field is treated as `Bytes`, not `Vec<u8>`
    config
        .bytes([".cescontrol.ChunkedDataResponse.data"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/cescontrol.proto"], &["proto"])
        .unwrap();
}
