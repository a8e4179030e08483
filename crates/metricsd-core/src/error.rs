//! Error taxonomy of the update pipeline.
//!
//! Every front end maps these variants onto its own status codes; the
//! HTTP mapping is 400 / 501 / 404 / 400 / 500 in declaration order.

use metricsd_crypto::CryptoError;
use metricsd_types::MetricParseError;

/// Errors returned by [`crate::UpdatePipeline`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    /// A required field is absent or unparsable.
    #[error("invalid metric: {0}")]
    Validation(String),

    /// The metric kind is neither `gauge` nor `counter`.
    #[error("unknown metric type: {0}")]
    UnknownKind(String),

    /// No metric of that kind and name is stored, or the name is empty.
    #[error("metric not found: {0}")]
    NotFound(String),

    /// The metric's tag does not match the shared secret.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A serialization or storage fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MetricParseError> for MetricError {
    fn from(err: MetricParseError) -> Self {
        match err {
            MetricParseError::EmptyName => Self::NotFound("metric name is empty".to_owned()),
            MetricParseError::UnknownKind(kind) => Self::UnknownKind(kind),
            other @ (MetricParseError::MissingField { .. } | MetricParseError::BadValue(_)) => {
                Self::Validation(other.to_string())
            }
        }
    }
}

impl From<CryptoError> for MetricError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MissingTag(_) | CryptoError::TagMismatch(_) => {
                Self::Authentication(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
