//! Error types for the persistence backend.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`], I/O and [`serde_json`] errors.

use std::time::Duration;

/// Errors that can occur in the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Reading or writing the snapshot file failed.
    #[error("Snapshot file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database did not answer within the deadline.
    #[error("PostgreSQL did not respond within {0:?}")]
    Timeout(Duration),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
