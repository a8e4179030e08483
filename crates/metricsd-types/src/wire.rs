//! JSON wire schema shared by the HTTP front end and the reporter.
//!
//! ```json
//! {"id": "Alloc", "type": "gauge", "value": 2128506.0, "hash": "9f..."}
//! {"id": "PollCount", "type": "counter", "delta": 5}
//! ```
//!
//! The same shape is used for queries (`POST /value/`), where only `id`
//! and `type` are meaningful on the way in.

use serde::{Deserialize, Serialize};

use crate::error::MetricParseError;
use crate::metric::{Metric, MetricKind, MetricValue};

/// A metric as it travels over JSON.
///
/// `type` stays a string here so that an unknown kind can be reported
/// distinctly from a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricJson {
    /// Metric name.
    #[serde(default)]
    pub id: String,
    /// `gauge` or `counter`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Counter delta (or total, in query responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    /// Gauge value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Hex HMAC-SHA256 tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl MetricJson {
    /// Parse only the `(kind, id)` pair, as needed by point queries.
    pub fn query_key(&self) -> Result<(MetricKind, &str), MetricParseError> {
        if self.id.is_empty() {
            return Err(MetricParseError::EmptyName);
        }
        let kind: MetricKind = self.kind.parse()?;
        Ok((kind, self.id.as_str()))
    }
}

impl TryFrom<MetricJson> for Metric {
    type Error = MetricParseError;

    /// Validate a wire metric: known kind, non-empty name, and the
    /// kind's required field present.
    fn try_from(wire: MetricJson) -> Result<Self, Self::Error> {
        let kind: MetricKind = wire.kind.parse()?;
        if wire.id.is_empty() {
            return Err(MetricParseError::EmptyName);
        }
        let value = match kind {
            MetricKind::Gauge => {
                let value = wire.value.ok_or(MetricParseError::MissingField {
                    kind: kind.as_str(),
                    field: "value",
                })?;
                if !value.is_finite() {
                    return Err(MetricParseError::BadValue(value.to_string()));
                }
                MetricValue::Gauge(value)
            }
            MetricKind::Counter => MetricValue::Counter(wire.delta.ok_or(
                MetricParseError::MissingField {
                    kind: kind.as_str(),
                    field: "delta",
                },
            )?),
        };
        Ok(Self {
            name: wire.id,
            value,
            tag: wire.hash.filter(|h| !h.is_empty()),
        })
    }
}

impl From<&Metric> for MetricJson {
    fn from(metric: &Metric) -> Self {
        let (delta, value) = match metric.value {
            MetricValue::Gauge(v) => (None, Some(v)),
            MetricValue::Counter(d) => (Some(d), None),
        };
        Self {
            id: metric.name.clone(),
            kind: metric.kind().as_str().to_owned(),
            delta,
            value,
            hash: metric.tag.clone(),
        }
    }
}
