//! Collector configuration.
//!
//! One immutable [`CollectorConfig`] is resolved once at startup from
//! four layers, highest priority first:
//!
//! 1. command-line flags ([`ConfigOverrides`])
//! 2. environment variables (`ADDRESS`, `STORE_INTERVAL`, ...)
//! 3. a JSON config file (`-c` / `CONFIG`)
//! 4. built-in defaults
//!
//! Durations accept `300`, `300s`, `5m`, `1h` or `250ms`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use ipnet::IpNet;
use serde::Deserialize;

/// Default HTTP bind address.
pub const DEFAULT_ADDRESS: &str = "localhost:8080";

/// Default RPC bind address.
pub const DEFAULT_GRPC_ADDRESS: &str = "0.0.0.0:3200";

/// Default persistence interval.
pub const DEFAULT_STORE_INTERVAL: &str = "300s";

/// Default snapshot file.
pub const DEFAULT_STORE_FILE: &str = "/tmp/devops-metrics-db.json";

/// Environment variables consulted, with the config key each one sets.
const ENV_KEYS: [(&str, &str); 9] = [
    ("ADDRESS", "address"),
    ("GRPC_ADDRESS", "grpc_address"),
    ("STORE_INTERVAL", "store_interval"),
    ("STORE_FILE", "store_file"),
    ("RESTORE", "restore"),
    ("KEY", "key"),
    ("CRYPTO_KEY", "crypto_key"),
    ("DATABASE_DSN", "database_dsn"),
    ("TRUSTED_SUBNET", "trusted_subnet"),
];

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "CONFIG";

/// Errors that can occur when resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A layer could not be read or the merged value could not be decoded.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A duration field is not in a recognised form.
    #[error("invalid duration for {field}: {value:?}")]
    Duration {
        /// The offending key.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// The trusted subnet is not valid CIDR notation.
    #[error("invalid trusted subnet {value:?}: {source}")]
    Subnet {
        /// The raw value.
        value: String,
        /// The underlying parse error.
        source: ipnet::AddrParseError,
    },

    /// A bind address is not `host:port`.
    #[error("invalid address for {field}: {value:?}")]
    Address {
        /// The offending key.
        field: &'static str,
        /// The raw value.
        value: String,
    },
}

/// Values supplied on the command line. `None` leaves the lower layers
/// in charge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `-a`
    pub address: Option<String>,
    /// `-g`
    pub grpc_address: Option<String>,
    /// `-i`
    pub store_interval: Option<String>,
    /// `-f`
    pub store_file: Option<String>,
    /// `-r`
    pub restore: Option<bool>,
    /// `-k`
    pub key: Option<String>,
    /// `--crypto-key`
    pub crypto_key: Option<String>,
    /// `-d`
    pub database_dsn: Option<String>,
    /// `-t`
    pub trusted_subnet: Option<String>,
    /// `-c`
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    address: String,
    grpc_address: String,
    store_interval: String,
    store_file: String,
    restore: bool,
    key: Option<String>,
    crypto_key: Option<String>,
    database_dsn: Option<String>,
    trusted_subnet: Option<String>,
}

/// Fully resolved, immutable collector configuration.
#[derive(Clone, PartialEq)]
pub struct CollectorConfig {
    /// HTTP bind address (`host:port`).
    pub address: String,
    /// RPC bind address (`host:port`).
    pub grpc_address: String,
    /// Snapshot period. Zero means every update is written synchronously.
    pub store_interval: Duration,
    /// Snapshot file; `None` disables the file sink.
    pub store_file: Option<PathBuf>,
    /// Whether to load persisted state at startup.
    pub restore: bool,
    /// Shared HMAC secret.
    pub key: Option<String>,
    /// Private key used to decrypt request bodies.
    pub crypto_key: Option<PathBuf>,
    /// `PostgreSQL` connection string; `None` disables the database sink.
    pub database_dsn: Option<String>,
    /// Only sources inside this network may submit updates.
    pub trusted_subnet: Option<IpNet>,
}

impl std::fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("address", &self.address)
            .field("grpc_address", &self.grpc_address)
            .field("store_interval", &self.store_interval)
            .field("store_file", &self.store_file)
            .field("restore", &self.restore)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("crypto_key", &self.crypto_key)
            .field("database_dsn", &self.database_dsn.as_ref().map(|_| "<redacted>"))
            .field("trusted_subnet", &self.trusted_subnet)
            .finish()
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            grpc_address: DEFAULT_GRPC_ADDRESS.to_owned(),
            store_interval: Duration::from_secs(300),
            store_file: Some(PathBuf::from(DEFAULT_STORE_FILE)),
            restore: true,
            key: None,
            crypto_key: None,
            database_dsn: None,
            trusted_subnet: None,
        }
    }
}

impl CollectorConfig {
    /// Resolve configuration from flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any layer is unreadable or any value is
    /// malformed.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(overrides, &env)
    }

    /// Resolve configuration from flags and an explicit environment map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any layer is unreadable or any value is
    /// malformed.
    pub fn resolve(
        overrides: &ConfigOverrides,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("address", DEFAULT_ADDRESS)?
            .set_default("grpc_address", DEFAULT_GRPC_ADDRESS)?
            .set_default("store_interval", DEFAULT_STORE_INTERVAL)?
            .set_default("store_file", DEFAULT_STORE_FILE)?
            .set_default("restore", true)?;

        let config_file = overrides
            .config_file
            .clone()
            .or_else(|| env.get(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from));
        if let Some(path) = &config_file {
            builder = builder.add_source(json_file(path));
        }

        let known: config::Map<String, String> = ENV_KEYS
            .iter()
            .filter_map(|(var, key)| env.get(*var).map(|v| ((*key).to_owned(), v.clone())))
            .collect();
        let raw: RawConfig = builder
            .add_source(Environment::default().source(Some(known)))
            .set_override_option("address", overrides.address.clone())?
            .set_override_option("grpc_address", overrides.grpc_address.clone())?
            .set_override_option("store_interval", overrides.store_interval.clone())?
            .set_override_option("store_file", overrides.store_file.clone())?
            .set_override_option("restore", overrides.restore)?
            .set_override_option("key", overrides.key.clone())?
            .set_override_option("crypto_key", overrides.crypto_key.clone())?
            .set_override_option("database_dsn", overrides.database_dsn.clone())?
            .set_override_option("trusted_subnet", overrides.trusted_subnet.clone())?
            .build()?
            .try_deserialize()?;

        let config = Self::try_from(raw)?;
        if let Some(path) = config_file {
            tracing::info!(path = %path.display(), "Merged config file");
        }
        Ok(config)
    }
}

impl TryFrom<RawConfig> for CollectorConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        check_address("address", &raw.address)?;
        check_address("grpc_address", &raw.grpc_address)?;
        let store_interval =
            parse_duration(&raw.store_interval).ok_or_else(|| ConfigError::Duration {
                field: "store_interval",
                value: raw.store_interval.clone(),
            })?;
        let trusted_subnet = non_empty(raw.trusted_subnet)
            .map(|value| {
                value
                    .trim()
                    .parse::<IpNet>()
                    .map_err(|source| ConfigError::Subnet { value, source })
            })
            .transpose()?;

        Ok(Self {
            address: raw.address,
            grpc_address: raw.grpc_address,
            store_interval,
            store_file: non_empty(Some(raw.store_file)).map(PathBuf::from),
            restore: raw.restore,
            key: non_empty(raw.key),
            crypto_key: non_empty(raw.crypto_key).map(PathBuf::from),
            database_dsn: non_empty(raw.database_dsn),
            trusted_subnet,
        })
    }
}

fn json_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Json).required(true)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_address(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.parse::<SocketAddr>().is_ok() {
        return Ok(());
    }
    let valid = value
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Address {
            field,
            value: value.to_owned(),
        })
    }
}

/// Parse `N`, `Ns`, `Nm`, `Nh` or `Nms` into a [`Duration`].
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let n: u64 = digits.parse().ok()?;
    match unit {
        "" | "s" => Some(Duration::from_secs(n)),
        "ms" => Some(Duration::from_millis(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs),
        "h" => n.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
