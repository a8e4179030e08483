//! Error types for the reporter.

use metricsd_crypto::CryptoError;

/// Errors that can occur while building or sending a report.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// Signing, key loading or body encryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The batch could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its response read.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The RPC channel could not be established.
    #[error("RPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The RPC call itself failed.
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// The collector answered but refused the batch.
    #[error("collector rejected the batch: {0}")]
    Rejected(String),
}
