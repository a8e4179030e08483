//! The metric model.
//!
//! A metric is a name plus exactly one typed payload: a gauge carries the
//! new absolute value, a counter carries a delta that is added to the
//! stored total. The payload is a closed enum so every dispatch on the
//! kind is checked exhaustively at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricParseError;
use crate::format::{format_counter, format_gauge};

/// Wire name of the gauge kind.
pub const GAUGE: &str = "gauge";

/// Wire name of the counter kind.
pub const COUNTER: &str = "counter";

/// The kind of a metric, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// New value overwrites the stored value.
    Gauge,
    /// Delta is added to the accumulated stored value.
    Counter,
}

impl MetricKind {
    /// The lowercase wire name (`gauge` / `counter`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => GAUGE,
            Self::Counter => COUNTER,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            GAUGE => Ok(Self::Gauge),
            COUNTER => Ok(Self::Counter),
            other => Err(MetricParseError::UnknownKind(other.to_owned())),
        }
    }
}

/// The typed payload of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Absolute gauge reading.
    Gauge(f64),
    /// Counter increment.
    Counter(i64),
}

impl MetricValue {
    /// The kind this payload belongs to.
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Gauge(_) => MetricKind::Gauge,
            Self::Counter(_) => MetricKind::Counter,
        }
    }

    /// Parse a raw textual value for the given kind.
    ///
    /// Gauges must be finite floats; counters are signed 64-bit integers.
    pub fn parse(kind: MetricKind, raw: &str) -> Result<Self, MetricParseError> {
        match kind {
            MetricKind::Gauge => {
                let value: f64 = raw
                    .parse()
                    .map_err(|_| MetricParseError::BadValue(raw.to_owned()))?;
                if !value.is_finite() {
                    return Err(MetricParseError::BadValue(raw.to_owned()));
                }
                Ok(Self::Gauge(value))
            }
            MetricKind::Counter => raw
                .parse::<i64>()
                .map(Self::Counter)
                .map_err(|_| MetricParseError::BadValue(raw.to_owned())),
        }
    }

    /// Fixed rendering used inside the signing payload.
    ///
    /// Gauges use six fixed decimals, counters plain decimal. Both sides
    /// of the wire must agree on this byte-for-byte.
    pub fn canonical(&self) -> String {
        match self {
            Self::Gauge(v) => format!("{v:.6}"),
            Self::Counter(d) => d.to_string(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauge(v) => f.write_str(&format_gauge(*v)),
            Self::Counter(d) => f.write_str(&format_counter(*d)),
        }
    }
}

/// A named metric with an optional integrity tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric name. Never empty once constructed through a parser.
    pub name: String,
    /// Kind-specific payload.
    pub value: MetricValue,
    /// Hex-encoded HMAC-SHA256 tag, if the sender signed the metric.
    pub tag: Option<String>,
}

impl Metric {
    /// Build an unsigned gauge.
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Gauge(value),
            tag: None,
        }
    }

    /// Build an unsigned counter increment.
    pub fn counter(name: impl Into<String>, delta: i64) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Counter(delta),
            tag: None,
        }
    }

    /// Parse the three path segments of `/update/{kind}/{name}/{value}`.
    ///
    /// The name is checked first, then the kind, then the value, so an
    /// unknown kind wins over an unparsable value.
    pub fn from_parts(kind: &str, name: &str, raw: &str) -> Result<Self, MetricParseError> {
        if name.is_empty() {
            return Err(MetricParseError::EmptyName);
        }
        let kind: MetricKind = kind.parse()?;
        let value = MetricValue::parse(kind, raw)?;
        Ok(Self {
            name: name.to_owned(),
            value,
            tag: None,
        })
    }

    /// The kind of this metric.
    pub const fn kind(&self) -> MetricKind {
        self.value.kind()
    }

    /// Canonical signing payload: `"<name>:<kind>:<value-or-delta>"`.
    pub fn signing_payload(&self) -> String {
        format!("{}:{}:{}", self.name, self.kind(), self.value.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        assert_eq!("gauge".parse::<MetricKind>(), Ok(MetricKind::Gauge));
        assert_eq!("counter".parse::<MetricKind>(), Ok(MetricKind::Counter));
        assert_eq!(MetricKind::Counter.to_string(), "counter");
    }

    #[test]
    fn unknown_kind_is_reported_before_bad_value() {
        let err = Metric::from_parts("integer", "x", "str");
        assert_eq!(err, Err(MetricParseError::UnknownKind("integer".to_owned())));
    }

    #[test]
    fn counter_rejects_non_integer() {
        assert!(matches!(
            Metric::from_parts("counter", "x", "str"),
            Err(MetricParseError::BadValue(_))
        ));
        assert!(matches!(
            Metric::from_parts("counter", "x", "1.5"),
            Err(MetricParseError::BadValue(_))
        ));
    }

    #[test]
    fn gauge_rejects_non_finite() {
        assert!(Metric::from_parts("gauge", "x", "NaN").is_err());
        assert!(Metric::from_parts("gauge", "x", "inf").is_err());
        assert!(Metric::from_parts("gauge", "x", "-3.25").is_ok());
    }

    #[test]
    fn empty_name_is_rejected_first() {
        assert_eq!(
            Metric::from_parts("nope", "", "1"),
            Err(MetricParseError::EmptyName)
        );
    }

    #[test]
    fn signing_payload_uses_fixed_rendering() {
        assert_eq!(
            Metric::gauge("Alloc", 2_128_506.0).signing_payload(),
            "Alloc:gauge:2128506.000000"
        );
        assert_eq!(
            Metric::counter("PollCount", -7).signing_payload(),
            "PollCount:counter:-7"
        );
    }
}
