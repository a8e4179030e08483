//! Shared application state for the HTTP front end.

use ipnet::IpNet;
use metricsd_core::UpdatePipeline;
use metricsd_crypto::Decryptor;
use metricsd_db::PostgresPool;

/// Everything a request handler or middleware needs.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The pipeline shared with the RPC front end.
    pub pipeline: UpdatePipeline,
    /// Decrypts update bodies when a private key is configured.
    pub decryptor: Option<Decryptor>,
    /// Only sources inside this network may submit updates.
    pub trusted_subnet: Option<IpNet>,
    /// Database pool probed by `/ping`.
    pub database: Option<PostgresPool>,
}

impl AppState {
    /// State with no decryption, no subnet filter and no database.
    pub const fn new(pipeline: UpdatePipeline) -> Self {
        Self {
            pipeline,
            decryptor: None,
            trusted_subnet: None,
            database: None,
        }
    }

    /// Decrypt update bodies with `decryptor`.
    #[must_use]
    pub fn with_decryptor(mut self, decryptor: Option<Decryptor>) -> Self {
        self.decryptor = decryptor;
        self
    }

    /// Restrict update routes to `subnet`.
    #[must_use]
    pub fn with_trusted_subnet(mut self, subnet: Option<IpNet>) -> Self {
        self.trusted_subnet = subnet;
        self
    }

    /// Probe `pool` on `/ping`.
    #[must_use]
    pub fn with_database(mut self, pool: Option<PostgresPool>) -> Self {
        self.database = pool;
        self
    }
}
