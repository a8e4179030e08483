//! Shared type definitions for metricsd.
//!
//! This crate is the single source of truth for the metric model used by
//! the collector, its persistence sinks and the reporting client.
//!
//! # Modules
//!
//! - [`metric`] -- The closed [`MetricValue`] variant and the [`Metric`] record
//! - [`wire`] -- JSON wire schema (`{"id","type","delta","value","hash"}`)
//! - [`snapshot`] -- Full serialized copy of both value tables
//! - [`format`] -- Plain-text rendering of stored values
//! - [`error`] -- Parse and validation errors for incoming metrics

pub mod error;
pub mod format;
pub mod metric;
pub mod snapshot;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use error::MetricParseError;
pub use format::{format_counter, format_gauge};
pub use metric::{Metric, MetricKind, MetricValue};
pub use snapshot::Snapshot;
pub use wire::MetricJson;
