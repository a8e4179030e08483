//! Reporter configuration.
//!
//! Flags win over environment variables, which win over the defaults.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use metricsd_core::config::parse_duration;

/// Metric reporter: samples in-process metrics and ships them to a collector.
#[derive(Clone, PartialEq, Eq, Parser)]
#[command(name = "metricsd-reporter", version, about)]
pub struct ReporterConfig {
    /// Collector HTTP address (`host:port` or a full URL).
    #[arg(short = 'a', env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// How often to take a sample.
    #[arg(short = 'p', env = "POLL_INTERVAL", default_value = "2s", value_parser = interval)]
    pub poll_interval: Duration,

    /// How often to send the accumulated batch.
    #[arg(short = 'r', env = "REPORT_INTERVAL", default_value = "10s", value_parser = interval)]
    pub report_interval: Duration,

    /// Shared HMAC secret.
    #[arg(short = 'k', env = "KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// PEM public key used to encrypt HTTP bodies.
    #[arg(long = "crypto-key", env = "CRYPTO_KEY")]
    pub crypto_key: Option<PathBuf>,

    /// Collector gRPC address; when set, batches go over RPC instead of HTTP.
    #[arg(long = "grpc", env = "GRPC_ADDRESS")]
    pub grpc_address: Option<String>,
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("address", &self.address)
            .field("poll_interval", &self.poll_interval)
            .field("report_interval", &self.report_interval)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("crypto_key", &self.crypto_key)
            .field("grpc_address", &self.grpc_address)
            .finish()
    }
}

/// Parse a positive interval.
fn interval(raw: &str) -> Result<Duration, String> {
    match parse_duration(raw) {
        Some(d) if d.is_zero() => Err("interval must be positive".to_owned()),
        Some(d) => Ok(d),
        None => Err(format!("invalid duration '{raw}'")),
    }
}
