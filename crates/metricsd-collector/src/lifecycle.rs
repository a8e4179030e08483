//! Database bring-up and the run/drain/flush tail of the collector.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metricsd_core::Persister;
use metricsd_db::{DbError, PostgresConfig, PostgresPool};
use metricsd_server::ServerError;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{info, warn};

use crate::error::CollectorError;

/// How long a pooled query waits for a connection before failing.
///
/// Kept short: with synchronous persistence every update waits on it
/// while the database is down.
pub const DATABASE_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of a listener task: its name and how it ended.
pub type ListenerExit = (&'static str, Result<(), ServerError>);

/// Build the database pool and create the metric tables.
///
/// Only a malformed DSN is fatal. An unreachable database is logged and
/// the pool is still returned, so `/ping` reports it and every later save
/// fails on its own.
///
/// # Errors
///
/// Returns [`DbError::Config`] if `dsn` cannot be parsed.
pub async fn open_database(dsn: &str) -> Result<PostgresPool, DbError> {
    let config = PostgresConfig::new(dsn).with_connect_timeout(DATABASE_CONNECT_TIMEOUT);
    let pool = PostgresPool::connect_lazy(&config)?;
    if let Err(e) = pool.run_migrations().await {
        warn!(error = %e, "Database unavailable at startup; continuing without tables");
    }
    Ok(pool)
}

/// Run until `stop` resolves or any listener ends, then shut down.
///
/// Shutdown order: signal every listener, give them `drain_timeout` to
/// finish in-flight requests (aborting stragglers), wait for the periodic
/// snapshot task, then write the store to every sink. Returns the first
/// listener failure, if any.
pub async fn run_until_stopped(
    mut listeners: JoinSet<ListenerExit>,
    stop: impl Future<Output = ()>,
    shutdown_tx: &watch::Sender<bool>,
    drain_timeout: Duration,
    snapshots: Option<JoinHandle<()>>,
    persister: &Arc<Persister>,
) -> Option<CollectorError> {
    let mut failure = None;
    tokio::select! {
        () = stop => info!("Shutdown signal received"),
        Some(joined) = listeners.join_next() => {
            failure = listener_failure(joined);
            if failure.is_none() {
                warn!("A listener stopped unexpectedly; shutting down");
            }
        }
    }

    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(drain_timeout, async {
        while let Some(joined) = listeners.join_next().await {
            if let Some(err) = listener_failure(joined) {
                failure.get_or_insert(err);
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!(
            timeout_ms = drain_timeout.as_millis(),
            "Listeners did not drain in time; aborting"
        );
        listeners.abort_all();
    }

    if let Some(handle) = snapshots {
        if let Err(e) = handle.await {
            warn!(error = %e, "Snapshot task ended abnormally");
        }
    }

    persister.flush_all().await;
    failure
}

/// Turn a finished listener task into an error, if it failed.
fn listener_failure(joined: Result<ListenerExit, JoinError>) -> Option<CollectorError> {
    match joined {
        Ok((_, Ok(()))) => None,
        Ok((listener, Err(source))) => Some(CollectorError::Listener { listener, source }),
        Err(e) => Some(CollectorError::Task {
            message: e.to_string(),
        }),
    }
}
