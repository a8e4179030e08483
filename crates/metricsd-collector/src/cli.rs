//! Command-line flags.
//!
//! Every flag is optional; an absent flag leaves the environment, the
//! config file and the defaults in charge.

use std::path::PathBuf;

use clap::Parser;
use metricsd_core::ConfigOverrides;

/// Metric collector: accepts updates over HTTP and gRPC and persists them.
#[derive(Debug, Parser)]
#[command(name = "metricsd-collector", version, about)]
pub struct Cli {
    /// HTTP listen address (`host:port`).
    #[arg(short = 'a', value_name = "ADDR")]
    pub address: Option<String>,

    /// gRPC listen address (`host:port`).
    #[arg(short = 'g', value_name = "ADDR")]
    pub grpc_address: Option<String>,

    /// Snapshot interval (`300s`, `5m`, `0` for synchronous writes).
    #[arg(short = 'i', value_name = "DURATION")]
    pub store_interval: Option<String>,

    /// Snapshot file; empty disables the file sink.
    #[arg(short = 'f', value_name = "PATH")]
    pub store_file: Option<String>,

    /// Load persisted metrics at startup.
    #[arg(short = 'r', value_name = "BOOL")]
    pub restore: Option<bool>,

    /// Shared HMAC secret.
    #[arg(short = 'k', value_name = "KEY")]
    pub key: Option<String>,

    /// PEM private key used to decrypt update bodies.
    #[arg(long = "crypto-key", value_name = "PATH")]
    pub crypto_key: Option<String>,

    /// `PostgreSQL` connection string.
    #[arg(short = 'd', value_name = "DSN")]
    pub database_dsn: Option<String>,

    /// Trusted subnet in CIDR notation.
    #[arg(short = 't', value_name = "CIDR")]
    pub trusted_subnet: Option<String>,

    /// JSON config file.
    #[arg(short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            address: cli.address,
            grpc_address: cli.grpc_address,
            store_interval: cli.store_interval,
            store_file: cli.store_file,
            restore: cli.restore,
            key: cli.key,
            crypto_key: cli.crypto_key,
            database_dsn: cli.database_dsn,
            trusted_subnet: cli.trusted_subnet,
            config_file: cli.config,
        }
    }
}
