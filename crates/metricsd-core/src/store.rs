//! The in-memory metric store.
//!
//! Two name-keyed tables behind one [`RwLock`]. A batch is applied under
//! a single write guard, so readers never observe half of it. Names are
//! independent per kind.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use metricsd_types::{Metric, MetricKind, MetricValue, Snapshot, format_counter, format_gauge};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    gauges: BTreeMap<String, f64>,
    counters: BTreeMap<String, i64>,
}

impl Tables {
    fn apply(&mut self, metric: &Metric) {
        match metric.value {
            MetricValue::Gauge(value) => {
                self.gauges.insert(metric.name.clone(), value);
            }
            MetricValue::Counter(delta) => {
                let total = self.counters.entry(metric.name.clone()).or_insert(0);
                *total = total.wrapping_add(delta);
            }
        }
    }

    fn get(&self, kind: MetricKind, name: &str) -> Option<MetricValue> {
        match kind {
            MetricKind::Gauge => self.gauges.get(name).copied().map(MetricValue::Gauge),
            MetricKind::Counter => self.counters.get(name).copied().map(MetricValue::Counter),
        }
    }
}

/// Authoritative current values of every metric.
#[derive(Debug, Default)]
pub struct MetricStore {
    tables: RwLock<Tables>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one metric, if stored.
    pub async fn get(&self, kind: MetricKind, name: &str) -> Option<MetricValue> {
        self.tables.read().await.get(kind, name)
    }

    /// Apply every metric in order under one write guard.
    ///
    /// Gauges overwrite, counters add their delta to the stored total
    /// (starting from 0). Returns the distinct `(kind, name)` keys that
    /// were touched, in first-seen order.
    pub async fn apply_batch(&self, metrics: &[Metric]) -> Vec<(MetricKind, String)> {
        let mut touched: Vec<(MetricKind, String)> = Vec::with_capacity(metrics.len());
        let mut tables = self.tables.write().await;
        for metric in metrics {
            tables.apply(metric);
            let key = (metric.kind(), metric.name.as_str());
            if !touched.iter().any(|(k, n)| (*k, n.as_str()) == key) {
                touched.push((metric.kind(), metric.name.clone()));
            }
        }
        touched
    }

    /// Plain-text listing: all counters, then all gauges, each block
    /// sorted by name, one `"<name> <value>\n"` line per metric.
    pub async fn dump(&self) -> String {
        let tables = self.tables.read().await;
        let mut out = String::new();
        for (name, total) in &tables.counters {
            let _ = writeln!(out, "{name} {}", format_counter(*total));
        }
        for (name, value) in &tables.gauges {
            let _ = writeln!(out, "{name} {}", format_gauge(*value));
        }
        out
    }

    /// Copy both tables out at one instant.
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read().await;
        Snapshot {
            counters: tables.counters.clone(),
            gauges: tables.gauges.clone(),
        }
    }

    /// Replace both tables wholesale with the snapshot's contents.
    pub async fn load(&self, snapshot: Snapshot) {
        let mut tables = self.tables.write().await;
        tables.counters = snapshot.counters;
        tables.gauges = snapshot.gauges;
    }
}
