//! Current-value persistence in the `gauges` and `counters` tables.
//!
//! Single-row saves are upserts keyed by name. A full save replaces the
//! contents of both tables inside one transaction.

use metricsd_types::{MetricValue, Snapshot};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `gauges` and `counters` tables.
#[derive(Debug, Clone)]
pub struct MetricTables {
    pool: PgPool,
}

impl MetricTables {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read every row of both tables.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if either query fails.
    pub async fn load(&self) -> Result<Snapshot, DbError> {
        let gauges = sqlx::query_as::<_, (String, f64)>(r"SELECT name, value FROM gauges")
            .fetch_all(&self.pool)
            .await?;
        let counters = sqlx::query_as::<_, (String, i64)>(r"SELECT name, value FROM counters")
            .fetch_all(&self.pool)
            .await?;

        let snapshot = Snapshot {
            counters: counters.into_iter().collect(),
            gauges: gauges.into_iter().collect(),
        };
        tracing::info!(metrics = snapshot.len(), "Loaded metrics from PostgreSQL");
        Ok(snapshot)
    }

    /// Insert or update the stored value of one metric.
    ///
    /// For counters `value` is the accumulated total, not a delta.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert(&self, name: &str, value: MetricValue) -> Result<(), DbError> {
        match value {
            MetricValue::Gauge(v) => {
                sqlx::query(
                    r"INSERT INTO gauges (name, value) VALUES ($1, $2)
                      ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value",
                )
                .bind(name)
                .bind(v)
                .execute(&self.pool)
                .await?;
            }
            MetricValue::Counter(total) => {
                sqlx::query(
                    r"INSERT INTO counters (name, value) VALUES ($1, $2)
                      ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value",
                )
                .bind(name)
                .bind(total)
                .execute(&self.pool)
                .await?;
            }
        }
        tracing::debug!(name, kind = %value.kind(), "Upserted metric row");
        Ok(())
    }

    /// Replace the contents of both tables with `snapshot`.
    ///
    /// Runs as one transaction: either the tables hold exactly the
    /// snapshot afterwards or they are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement or the commit fails.
    pub async fn replace_all(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(r"DELETE FROM gauges").execute(&mut *tx).await?;
        sqlx::query(r"DELETE FROM counters").execute(&mut *tx).await?;

        for (name, value) in &snapshot.gauges {
            sqlx::query(r"INSERT INTO gauges (name, value) VALUES ($1, $2)")
                .bind(name)
                .bind(*value)
                .execute(&mut *tx)
                .await?;
        }
        for (name, total) in &snapshot.counters {
            sqlx::query(r"INSERT INTO counters (name, value) VALUES ($1, $2)")
                .bind(name)
                .bind(*total)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(metrics = snapshot.len(), "Resynced metric tables");
        Ok(())
    }
}
