//! Axum router construction for the HTTP front end.
//!
//! Update routes sit behind body decryption and the trust filter; query
//! routes do not. Every response may be gzip-compressed.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{decrypt_body, trust_filter};
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `POST /update/{kind}/{name}/{value}`, `POST /update/{kind}/{name}/`
/// - `POST /update/`, `POST /updates/`
/// - `POST /value/`, `GET /value/{kind}/{name}`
/// - `GET /`, `GET /ping`
pub fn build_router(state: Arc<AppState>) -> Router {
    // Layers run outermost-last-added: decrypt first, then the filter.
    let updates = Router::new()
        .route("/update/", post(handlers::update_json))
        .route("/updates/", post(handlers::update_batch))
        .route("/update/{kind}/{name}/", post(handlers::update_without_value))
        .route("/update/{kind}/{name}/{value}", post(handlers::update_path))
        .layer(from_fn_with_state(Arc::clone(&state), trust_filter))
        .layer(from_fn_with_state(Arc::clone(&state), decrypt_body));

    Router::new()
        .route("/", get(handlers::dump))
        .route("/ping", get(handlers::ping))
        .route("/value/", post(handlers::value_json))
        .route("/value/{kind}/{name}", get(handlers::value_path))
        .merge(updates)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
