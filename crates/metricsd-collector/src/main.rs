//! Collector binary for metricsd.
//!
//! Wires configuration, persistence sinks, the update pipeline and both
//! listeners together, then runs until a termination signal arrives or a
//! listener fails.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Resolve configuration (flags > environment > JSON file > defaults)
//! 3. Open the `PostgreSQL` pool and create tables, if a DSN is configured
//!    (an unreachable database is logged, not fatal)
//! 4. Assemble persistence sinks and restore persisted metrics
//! 5. Load the decryption key, if configured
//! 6. Start the periodic snapshot task
//! 7. Bind and start the HTTP and gRPC listeners
//! 8. Wait for a signal or a listener failure, then drain and flush

mod cli;
mod error;
mod lifecycle;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metricsd_core::{CollectorConfig, ConfigOverrides, MetricStore, Persister, UpdatePipeline};
use metricsd_crypto::Signer;
use metricsd_db::{FileStore, MetricTables, PostgresPool, Sink};
use metricsd_server::AppState;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CollectorError;
use crate::lifecycle::ListenerExit;

/// How long in-flight requests get to finish after shutdown is requested.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), CollectorError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("metricsd-collector starting");

    // 2. Resolve configuration.
    let overrides = ConfigOverrides::from(Cli::parse());
    let config = CollectorConfig::load(&overrides)?;
    info!(?config, "Configuration loaded");

    // 3. Database.
    let database = match config.database_dsn.as_deref() {
        Some(dsn) => Some(lifecycle::open_database(dsn).await?),
        None => {
            info!("No database configured");
            None
        }
    };

    // 4. Persistence.
    let store = Arc::new(MetricStore::new());
    let persister = Arc::new(Persister::new(
        Arc::clone(&store),
        build_sinks(&config, database.as_ref()),
        config.store_interval,
    ));
    if config.restore {
        let restored = persister.restore().await;
        info!(restored, "Restore finished");
    }

    let signer = Signer::new(config.key.as_deref());
    let pipeline = UpdatePipeline::new(store, signer, Arc::clone(&persister));

    // 5. Decryption key.
    let decryptor = config
        .crypto_key
        .as_deref()
        .map(metricsd_crypto::load_decryptor)
        .transpose()?;

    let state = Arc::new(
        AppState::new(pipeline.clone())
            .with_decryptor(decryptor)
            .with_trusted_subnet(config.trusted_subnet)
            .with_database(database.clone()),
    );

    // 6. Periodic snapshots.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let snapshots = persister.spawn_periodic(shutdown_rx.clone());

    // 7. Listeners.
    let http_listener = metricsd_server::bind(&config.address)
        .await
        .map_err(|source| CollectorError::Listener {
            listener: "http",
            source,
        })?;

    let mut listeners: JoinSet<ListenerExit> = JoinSet::new();
    {
        let shutdown = shutdown_rx.clone();
        listeners.spawn(async move {
            ("http", metricsd_server::serve_http(http_listener, state, shutdown).await)
        });
    }
    {
        let addr = config.grpc_address.clone();
        let shutdown = shutdown_rx;
        listeners.spawn(async move {
            ("grpc", metricsd_server::serve_rpc(&addr, pipeline, shutdown).await)
        });
    }

    // 8. Run until a signal arrives or a listener stops.
    let failure = lifecycle::run_until_stopped(
        listeners,
        termination_signal(),
        &shutdown_tx,
        DRAIN_TIMEOUT,
        snapshots,
        &persister,
    )
    .await;

    if let Some(pool) = database {
        pool.close().await;
    }

    match failure {
        Some(err) => {
            error!(error = %err, "metricsd-collector stopped after a listener failure");
            Err(err)
        }
        None => {
            info!("metricsd-collector stopped");
            Ok(())
        }
    }
}

/// Sinks in configuration order: the snapshot file, then the database.
fn build_sinks(config: &CollectorConfig, database: Option<&PostgresPool>) -> Vec<Sink> {
    let mut sinks = Vec::with_capacity(2);
    if let Some(path) = &config.store_file {
        sinks.push(Sink::File(FileStore::new(path)));
    }
    if let Some(pool) = database {
        sinks.push(Sink::Postgres(MetricTables::new(pool.pool().clone())));
    }
    sinks
}

/// Resolve on Ctrl-C, or on SIGTERM / SIGQUIT where available.
async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let unix_signals = async {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = quit.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Unix signal handlers unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let unix_signals = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = unix_signals => {}
    }
}
