//! Protocol front ends for the metricsd collector.
//!
//! This crate exposes two presentations of one [`UpdatePipeline`]:
//!
//! - **HTTP** (Axum): path and JSON updates, point queries, a plain-text
//!   dump and a database liveness probe. Update routes are wrapped in
//!   body decryption and the trusted-subnet filter.
//! - **gRPC** (tonic): a single batch-update call on its own listener.
//!
//! [`UpdatePipeline`]: metricsd_core::UpdatePipeline

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod rpc;
pub mod server;
pub mod state;

/// Generated gRPC messages, server and client.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::restriction)]
pub mod proto {
    tonic::include_proto!("metrics");
}

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use rpc::{MetricsService, serve_rpc};
pub use server::{ServerError, bind, serve_http};
pub use state::AppState;
