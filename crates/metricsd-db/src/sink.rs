//! One persistence contract over both backends.
//!
//! Every sink supports `load`, `save_all` and `save_one`. The file sink
//! only persists whole snapshots, so [`Sink::persists_rows`] tells the
//! caller whether per-metric saves are meaningful for a given sink.

use metricsd_types::{MetricValue, Snapshot};

use crate::error::DbError;
use crate::file_store::FileStore;
use crate::metric_tables::MetricTables;

/// A configured persistence destination.
#[derive(Debug, Clone)]
pub enum Sink {
    /// JSON snapshot file.
    File(FileStore),
    /// `gauges` / `counters` tables in `PostgreSQL`.
    Postgres(MetricTables),
}

impl Sink {
    /// Short name used in log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Whether [`Sink::save_one`] writes anything for this sink.
    pub const fn persists_rows(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    /// Read everything the sink holds. `Ok(None)` means nothing was ever
    /// persisted.
    pub async fn load(&self) -> Result<Option<Snapshot>, DbError> {
        match self {
            Self::File(file) => file.load().await,
            Self::Postgres(tables) => tables.load().await.map(Some),
        }
    }

    /// Persist a full snapshot, replacing what the sink held before.
    pub async fn save_all(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        match self {
            Self::File(file) => file.save(snapshot).await,
            Self::Postgres(tables) => tables.replace_all(snapshot).await,
        }
    }

    /// Persist the stored value of a single metric.
    ///
    /// A no-op for the file sink.
    pub async fn save_one(&self, name: &str, value: MetricValue) -> Result<(), DbError> {
        match self {
            Self::File(_) => Ok(()),
            Self::Postgres(tables) => tables.upsert(name, value).await,
        }
    }
}
