//! Errors raised while turning untrusted input into a [`Metric`](crate::Metric).

/// Reasons an incoming metric cannot be accepted.
///
/// The collector maps these onto its HTTP/RPC error taxonomy: an unknown
/// kind and an empty name get their own status codes, everything else is
/// a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricParseError {
    /// The metric name (`id`) is empty.
    #[error("metric name is empty")]
    EmptyName,

    /// The kind is neither `gauge` nor `counter`.
    #[error("unknown metric kind: {0}")]
    UnknownKind(String),

    /// The field required by the kind (`value` or `delta`) is absent.
    #[error("{kind} metric is missing its `{field}` field")]
    MissingField {
        /// The kind that was requested.
        kind: &'static str,
        /// The field that was expected.
        field: &'static str,
    },

    /// The raw value could not be parsed for the kind.
    #[error("bad value: {0}")]
    BadValue(String),
}
