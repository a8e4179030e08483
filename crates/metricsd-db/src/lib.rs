//! Persistence backend for metricsd (JSON snapshot file + `PostgreSQL`).
//!
//! Both backends sit behind the [`Sink`] enum so the collector can hold
//! any combination of them and treat them uniformly.
//!
//! ```text
//! MetricStore (in memory)
//!     |
//!     +-- full snapshot ----> FileStore    (one JSON document)
//!     |
//!     +-- row upsert -------> MetricTables (gauges / counters)
//!     +-- full resync ------> MetricTables (delete + reinsert, one tx)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool, migrations and liveness probe
//! - [`metric_tables`] -- Row-level operations on the `gauges`/`counters` tables
//! - [`file_store`] -- JSON snapshot file
//! - [`sink`] -- Uniform `load` / `save_all` / `save_one` dispatch
//! - [`error`] -- Shared error types

pub mod error;
pub mod file_store;
pub mod metric_tables;
pub mod postgres;
pub mod sink;

// Re-export primary types for convenience.
pub use error::DbError;
pub use file_store::FileStore;
pub use metric_tables::MetricTables;
pub use postgres::{PING_TIMEOUT, PostgresConfig, PostgresPool};
pub use sink::Sink;
