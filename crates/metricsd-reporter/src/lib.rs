//! Producer side of metricsd.
//!
//! A [`Reporter`] samples in-process metrics on a poll interval and, on a
//! report interval, signs the accumulated batch and ships it to the
//! collector over one of two transports:
//!
//! ```text
//! Sampler --> Signer --> HTTP (JSON, optional RSA envelope) --> POST /updates/
//!                    \-> gRPC Metrics.UpdateMetrics
//! ```

pub mod config;
pub mod error;
pub mod reporter;
pub mod sampler;
pub mod transport;

// Re-export primary types for convenience.
pub use config::ReporterConfig;
pub use error::ReporterError;
pub use reporter::Reporter;
pub use sampler::Sampler;
pub use transport::{HttpTransport, RpcTransport, Transport};
