//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/update/{kind}/{name}/{value}` | Path-encoded single update |
//! | `POST` | `/update/{kind}/{name}/` | Always 400 (no value segment) |
//! | `POST` | `/update/` | JSON update (object or array) |
//! | `POST` | `/updates/` | JSON batch update (array or object) |
//! | `POST` | `/value/` | JSON point query |
//! | `GET` | `/value/{kind}/{name}` | Plain-text point query |
//! | `GET` | `/` | Plain-text dump of every metric |
//! | `GET` | `/ping` | Database liveness probe |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use metricsd_core::MetricError;
use metricsd_db::PING_TIMEOUT;
use metricsd_types::{Metric, MetricJson, MetricKind, MetricParseError};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned by successful updates: `{"Status":"OK"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    /// Always `OK`.
    #[serde(rename = "Status")]
    pub status: String,
}

fn ok() -> Json<StatusBody> {
    Json(StatusBody {
        status: "OK".to_owned(),
    })
}

/// A JSON update body is either one metric or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<MetricJson>),
    One(MetricJson),
}

fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if media_type.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Content-Type must be application/json, got {content_type:?}"
        )))
    }
}

/// Convert a wire metric. On JSON routes an empty `id` is a bad request
/// rather than a missing resource.
fn from_wire(wire: MetricJson) -> Result<Metric, ApiError> {
    Metric::try_from(wire).map_err(|err| match err {
        MetricParseError::EmptyName => ApiError::BadRequest(err.to_string()),
        other => MetricError::from(other).into(),
    })
}

async fn apply_json(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
    require_json(headers)?;
    let parsed: OneOrMany = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    let wires = match parsed {
        OneOrMany::Many(wires) => wires,
        OneOrMany::One(wire) => vec![wire],
    };
    let metrics = wires
        .into_iter()
        .map(from_wire)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(metrics = metrics.len(), "JSON update");
    state.pipeline.apply_batch(metrics).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// `POST /update/{kind}/{name}/{value}`
pub async fn update_path(
    State(state): State<Arc<AppState>>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<Json<StatusBody>, ApiError> {
    let metric = Metric::from_parts(&kind, &name, &value).map_err(MetricError::from)?;
    tracing::debug!(kind = %kind, name = %name, value = %value, "Path update");
    state.pipeline.apply(metric).await?;
    Ok(ok())
}

/// `POST /update/{kind}/{name}/`
pub async fn update_without_value() -> ApiError {
    ApiError::BadRequest("missing value segment".to_owned())
}

/// `POST /update/`
pub async fn update_json(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusBody>, ApiError> {
    apply_json(&state, &headers, &body).await?;
    Ok(ok())
}

/// `POST /updates/`
pub async fn update_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusBody>, ApiError> {
    apply_json(&state, &headers, &body).await?;
    Ok(ok())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// `POST /value/` -- returns the metric with its stored value filled in,
/// signed when a secret is configured.
pub async fn value_json(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MetricJson>, ApiError> {
    require_json(&headers)?;
    let wire: MetricJson = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    let (kind, name) = wire
        .query_key()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let metric = state.pipeline.query(kind, name).await?;
    Ok(Json(MetricJson::from(&metric)))
}

/// `GET /value/{kind}/{name}`
pub async fn value_path(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let kind: MetricKind = kind
        .parse()
        .map_err(|e: MetricParseError| ApiError::BadRequest(e.to_string()))?;
    let value = state.pipeline.value(kind, &name).await?;
    Ok(value.to_string())
}

/// `GET /` -- served as `text/html` with a plain-text body.
pub async fn dump(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.pipeline.dump().await;
    ([(header::CONTENT_TYPE, "text/html")], body)
}

/// `GET /ping`
pub async fn ping(State(state): State<Arc<AppState>>) -> Result<(StatusCode, &'static str), ApiError> {
    let Some(db) = &state.database else {
        return Err(ApiError::Database("database is not configured".to_owned()));
    };
    db.ping(PING_TIMEOUT)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;
    Ok((StatusCode::OK, "OK"))
}
