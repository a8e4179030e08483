//! The update pipeline shared by every front end.
//!
//! ```text
//! front end --> validate --> authenticate (whole batch) --> MetricStore
//!                                                             |
//!                                                 Persister::after_update
//! ```
//!
//! A batch is all-or-nothing: every item is authenticated before any item
//! is applied, and the items are then applied under one store guard.

use std::sync::Arc;

use metricsd_crypto::Signer;
use metricsd_types::{Metric, MetricKind, MetricValue};

use crate::error::MetricError;
use crate::persist::Persister;
use crate::store::MetricStore;

/// Validates, authenticates and applies metrics.
#[derive(Debug, Clone)]
pub struct UpdatePipeline {
    store: Arc<MetricStore>,
    signer: Signer,
    persister: Arc<Persister>,
}

impl UpdatePipeline {
    /// Assemble a pipeline over an existing store and persister.
    pub const fn new(store: Arc<MetricStore>, signer: Signer, persister: Arc<Persister>) -> Self {
        Self {
            store,
            signer,
            persister,
        }
    }

    /// A pipeline over a fresh store with no persistence.
    pub fn in_memory(signer: Signer) -> Self {
        let store = Arc::new(MetricStore::new());
        let persister = Arc::new(Persister::disabled(Arc::clone(&store)));
        Self::new(store, signer, persister)
    }

    /// The underlying store.
    pub const fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// The signer used for verification and query responses.
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Authenticate and apply one metric.
    pub async fn apply(&self, metric: Metric) -> Result<(), MetricError> {
        self.apply_batch(vec![metric]).await
    }

    /// Authenticate every metric, then apply them all in order.
    ///
    /// Nothing is applied if any item fails authentication.
    pub async fn apply_batch(&self, metrics: Vec<Metric>) -> Result<(), MetricError> {
        for metric in &metrics {
            self.signer.verify(metric).inspect_err(|e| {
                tracing::warn!(metric = %metric.name, error = %e, "Rejected unauthenticated metric");
            })?;
        }
        if metrics.is_empty() {
            return Ok(());
        }

        let touched = self.store.apply_batch(&metrics).await;
        tracing::debug!(
            metrics = metrics.len(),
            distinct = touched.len(),
            "Applied metric batch"
        );
        self.persister.after_update(&touched).await;
        Ok(())
    }

    /// Stored value of one metric.
    pub async fn value(&self, kind: MetricKind, name: &str) -> Result<MetricValue, MetricError> {
        self.store
            .get(kind, name)
            .await
            .ok_or_else(|| MetricError::NotFound(format!("{kind} {name}")))
    }

    /// Stored value of one metric as a full record, signed when a secret
    /// is configured.
    pub async fn query(&self, kind: MetricKind, name: &str) -> Result<Metric, MetricError> {
        let value = self.value(kind, name).await?;
        let mut metric = Metric {
            name: name.to_owned(),
            value,
            tag: None,
        };
        self.signer.sign(&mut metric)?;
        Ok(metric)
    }

    /// Plain-text listing of every stored metric.
    pub async fn dump(&self) -> String {
        self.store.dump().await
    }
}
