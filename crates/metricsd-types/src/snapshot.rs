//! Full copy of both value tables at one instant.
//!
//! Serialized as a single JSON object:
//!
//! ```json
//! {"Counters": {"PollCount": 12}, "Gauges": {"Alloc": 2128506}}
//! ```
//!
//! Either table may be `null` or absent in a file written by an older
//! collector; both decode as empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Serialized copy of the counter and gauge tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Counter totals keyed by name.
    #[serde(rename = "Counters", default, deserialize_with = "null_as_empty")]
    pub counters: BTreeMap<String, i64>,
    /// Gauge values keyed by name.
    #[serde(rename = "Gauges", default, deserialize_with = "null_as_empty")]
    pub gauges: BTreeMap<String, f64>,
}

impl Snapshot {
    /// Total number of entries across both tables.
    pub fn len(&self) -> usize {
        self.counters.len().saturating_add(self.gauges.len())
    }

    /// Whether both tables are empty.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty()
    }
}

fn null_as_empty<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Option::<BTreeMap<String, V>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
