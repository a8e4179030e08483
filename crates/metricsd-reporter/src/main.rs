//! Reporter binary for metricsd.
//!
//! Loads its configuration from flags and the environment, picks the
//! HTTP or gRPC transport, and runs the poll/report loop until Ctrl-C.

use clap::Parser;
use metricsd_crypto::Signer;
use metricsd_reporter::{HttpTransport, Reporter, ReporterConfig, ReporterError, RpcTransport, Transport};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ReporterError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("metricsd-reporter starting");

    // 2. Load configuration.
    let config = ReporterConfig::parse();
    info!(?config, "Configuration loaded");

    // 3. Build the transport.
    let transport = match config.grpc_address.as_deref() {
        Some(addr) => Transport::Rpc(RpcTransport::connect(addr).await?),
        None => {
            let encryptor = config
                .crypto_key
                .as_deref()
                .map(metricsd_crypto::load_encryptor)
                .transpose()?;
            Transport::Http(HttpTransport::new(&config.address, encryptor).await)
        }
    };

    // 4. Run until Ctrl-C.
    let reporter = Reporter::new(Signer::new(config.key.as_deref()), transport);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(reporter.run(
        config.poll_interval,
        config.report_interval,
        shutdown_rx,
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl-C handler unavailable; stopping");
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "Reporter task ended abnormally");
    }

    info!("metricsd-reporter stopped");
    Ok(())
}
