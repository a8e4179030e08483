//! Persistence scheduling.
//!
//! Decides when each [`Sink`] is written and keeps all sink I/O outside
//! the store lock. Writers take a separate mutex and read the store
//! *after* acquiring it, so a slow writer can never overwrite a newer
//! state with an older copy.
//!
//! | Trigger                  | File sink                | Database sink        |
//! |--------------------------|--------------------------|----------------------|
//! | accepted update          | full snapshot if sync    | upsert touched rows  |
//! | periodic timer           | full snapshot            | --                   |
//! | shutdown                 | full snapshot            | full resync          |
//!
//! Failures are logged per sink and swallowed.

use std::sync::Arc;
use std::time::Duration;

use metricsd_db::Sink;
use metricsd_types::MetricKind;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::store::MetricStore;

/// Writes the store to its configured sinks.
#[derive(Debug)]
pub struct Persister {
    store: Arc<MetricStore>,
    sinks: Vec<Sink>,
    interval: Duration,
    write_lock: Mutex<()>,
}

impl Persister {
    /// Create a persister. A zero `interval` makes file sinks synchronous:
    /// every accepted update rewrites the snapshot file.
    pub fn new(store: Arc<MetricStore>, sinks: Vec<Sink>, interval: Duration) -> Self {
        Self {
            store,
            sinks,
            interval,
            write_lock: Mutex::new(()),
        }
    }

    /// A persister with no sinks; every operation is a no-op.
    pub fn disabled(store: Arc<MetricStore>) -> Self {
        Self::new(store, Vec::new(), Duration::ZERO)
    }

    /// Whether file sinks are written on every update.
    pub const fn is_synchronous(&self) -> bool {
        self.interval.is_zero()
    }

    /// The configured sinks.
    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    /// Load the store from the preferred sink: the database if one is
    /// configured, otherwise the snapshot file.
    ///
    /// Returns the number of metrics loaded. A failed or empty load leaves
    /// the store untouched.
    pub async fn restore(&self) -> usize {
        let Some(sink) = self
            .sinks
            .iter()
            .find(|s| s.persists_rows())
            .or_else(|| self.sinks.first())
        else {
            return 0;
        };

        match sink.load().await {
            Ok(Some(snapshot)) => {
                let loaded = snapshot.len();
                self.store.load(snapshot).await;
                tracing::info!(sink = sink.name(), metrics = loaded, "Restored metric store");
                loaded
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::error!(sink = sink.name(), error = %e, "Failed to restore metric store");
                0
            }
        }
    }

    /// Persistence side effect of an accepted update.
    pub async fn after_update(&self, touched: &[(MetricKind, String)]) {
        if self.sinks.is_empty() || touched.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().await;

        for sink in &self.sinks {
            if sink.persists_rows() {
                for (kind, name) in touched {
                    let Some(value) = self.store.get(*kind, name).await else {
                        continue;
                    };
                    if let Err(e) = sink.save_one(name, value).await {
                        tracing::warn!(
                            sink = sink.name(),
                            metric = %name,
                            error = %e,
                            "Failed to persist metric"
                        );
                    }
                }
            } else if self.is_synchronous() {
                let snapshot = self.store.snapshot().await;
                if let Err(e) = sink.save_all(&snapshot).await {
                    tracing::warn!(sink = sink.name(), error = %e, "Failed to write snapshot");
                }
            }
        }
    }

    /// Write a full snapshot to every snapshot-only sink (the timer path).
    pub async fn save_snapshots(&self) {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.store.snapshot().await;
        for sink in self.sinks.iter().filter(|s| !s.persists_rows()) {
            match sink.save_all(&snapshot).await {
                Ok(()) => {
                    tracing::debug!(sink = sink.name(), metrics = snapshot.len(), "Periodic snapshot written");
                }
                Err(e) => {
                    tracing::warn!(sink = sink.name(), error = %e, "Failed to write periodic snapshot");
                }
            }
        }
    }

    /// Write the full store to every sink. Called once at shutdown.
    pub async fn flush_all(&self) {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.store.snapshot().await;
        for sink in &self.sinks {
            match sink.save_all(&snapshot).await {
                Ok(()) => {
                    tracing::info!(sink = sink.name(), metrics = snapshot.len(), "Final snapshot written");
                }
                Err(e) => {
                    tracing::error!(sink = sink.name(), error = %e, "Failed to write final snapshot");
                }
            }
        }
    }

    /// Start the periodic snapshot task.
    ///
    /// Returns `None` when the interval is zero or there is no
    /// snapshot-only sink to write. The task exits once `shutdown` turns
    /// `true` or its sender is dropped.
    pub fn spawn_periodic(
        self: &Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        if self.is_synchronous() || self.sinks.iter().all(Sink::persists_rows) {
            return None;
        }
        let persister = Arc::clone(self);
        let period = self.interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            tracing::info!(interval_ms = period.as_millis(), "Periodic snapshot task started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => persister.save_snapshots().await,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("Periodic snapshot task stopped");
        }))
    }
}
