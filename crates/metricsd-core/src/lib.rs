//! Metric store, update pipeline and persistence scheduling for metricsd.
//!
//! Both protocol front ends call into the same [`UpdatePipeline`], which
//! owns the one [`MetricStore`] and hands every accepted update to the
//! [`Persister`].
//!
//! # Modules
//!
//! - [`store`] -- Gauge and counter tables behind a single lock
//! - [`pipeline`] -- Authentication and batch application
//! - [`persist`] -- When and how each persistence sink is written
//! - [`config`] -- Layered, immutable collector configuration
//! - [`error`] -- Pipeline error taxonomy

pub mod config;
pub mod error;
pub mod persist;
pub mod pipeline;
pub mod store;

pub use config::{CollectorConfig, ConfigError, ConfigOverrides};
pub use error::MetricError;
pub use persist::Persister;
pub use pipeline::UpdatePipeline;
pub use store::MetricStore;
