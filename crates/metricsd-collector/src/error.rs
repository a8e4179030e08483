//! Error types for the collector binary.
//!
//! [`CollectorError`] is the top-level error type that wraps all possible
//! failure modes during startup and while the listeners run.

/// Top-level error for the collector binary.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// Configuration could not be resolved.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: metricsd_core::ConfigError,
    },

    /// The database DSN could not be parsed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: metricsd_db::DbError,
    },

    /// The private key could not be loaded.
    #[error("key error: {source}")]
    Crypto {
        /// The underlying crypto error.
        #[from]
        source: metricsd_crypto::CryptoError,
    },

    /// A listener failed to bind or stopped with an error.
    #[error("{listener} listener failed: {source}")]
    Listener {
        /// `http` or `grpc`.
        listener: &'static str,
        /// The underlying server error.
        source: metricsd_server::ServerError,
    },

    /// A listener task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
