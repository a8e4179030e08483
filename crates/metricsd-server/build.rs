//! Generates the gRPC messages, server and client from `proto/metrics.proto`.
//!
//! Uses the vendored `protoc` so no system protobuf compiler is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = prost_build::Config::new();
    config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos_with_config(config, &["proto/metrics.proto"], &["proto"])?;
    Ok(())
}
