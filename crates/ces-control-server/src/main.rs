#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use ces_control_core::proto::FILE_DESCRIPTOR_SET;
use ces_control_core::proto::dogu_log_messages_server::DoguLogMessagesServer;
use chrono::Duration;
use clap::Parser;
use server::config::{CliArgs, ServerConfig};
use server::logging::loki::{LokiConfig, LokiLogProvider};
use server::service::handler::LogMessageService;
use server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    let provider = LokiLogProvider::new(LokiConfig {
        base_url: config.loki_url.clone(),
        username: config.loki_username.clone(),
        password: config.loki_password.clone(),
        page_limit: config.query_page_limit,
        lookback: Duration::days(config.lookback_days),
    })?;
    let service = LogMessageService::new(Arc::new(provider), config.chunk_bytes);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<DoguLogMessagesServer<LogMessageService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    let incoming = TcpListenerStream::new(listener);

    tracing::info!(
        "Starting CES control service on {} (Loki at {})",
        config.server_addr,
        config.loki_url
    );

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_log_service(service))
        .serve_with_incoming_shutdown(incoming, shutdown_signal(health_reporter))
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn build_log_service(service: LogMessageService) -> DoguLogMessagesServer<LogMessageService> {
    DoguLogMessagesServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

async fn shutdown_signal(health_reporter: HealthReporter) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    health_reporter
        .set_not_serving::<DoguLogMessagesServer<LogMessageService>>()
        .await;
}
