//! Error types for the HTTP front end.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metricsd_core::MetricError;

/// Errors that can occur while handling an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The update pipeline rejected the request.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Malformed body, wrong content type or missing path segment.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The encrypted body could not be decrypted.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// The source address is outside the trusted subnet.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The database is not configured or did not answer.
    #[error("database unavailable: {0}")]
    Database(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Metric(err) => match err {
                MetricError::Validation(_) | MetricError::Authentication(_) => {
                    StatusCode::BAD_REQUEST
                }
                MetricError::UnknownKind(_) => StatusCode::NOT_IMPLEMENTED,
                MetricError::NotFound(_) => StatusCode::NOT_FOUND,
                MetricError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) | Self::Decrypt(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
