//! Per-metric HMAC-SHA256 signing.
//!
//! The tag is `hex(HMAC-SHA256(secret, "<name>:<kind>:<value-or-delta>"))`,
//! see [`Metric::signing_payload`]. Verification decodes the supplied hex
//! and compares in constant time.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use metricsd_types::Metric;
use sha2::Sha256;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies metrics with an optional shared secret.
///
/// Cheap to clone. When constructed without a secret every operation is
/// a successful no-op.
#[derive(Clone, Default)]
pub struct Signer {
    secret: Option<Arc<[u8]>>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Signer {
    /// Create a signer. `None` or an empty secret disables signing.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::from(s.as_bytes())),
        }
    }

    /// A signer that never signs and accepts everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a shared secret is configured.
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Compute the hex tag for a metric, or `None` when disabled.
    pub fn compute(&self, metric: &Metric) -> Result<Option<String>, CryptoError> {
        let Some(secret) = &self.secret else {
            return Ok(None);
        };
        let mut mac = keyed(secret)?;
        mac.update(metric.signing_payload().as_bytes());
        Ok(Some(hex::encode(mac.finalize().into_bytes())))
    }

    /// Compute and attach the tag. Leaves the metric untouched when disabled.
    pub fn sign(&self, metric: &mut Metric) -> Result<(), CryptoError> {
        if let Some(tag) = self.compute(metric)? {
            metric.tag = Some(tag);
        }
        Ok(())
    }

    /// Recompute the tag and compare it with the one the metric carries.
    pub fn verify(&self, metric: &Metric) -> Result<(), CryptoError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };
        let supplied = metric
            .tag
            .as_deref()
            .ok_or_else(|| CryptoError::MissingTag(metric.name.clone()))?;
        let supplied =
            hex::decode(supplied).map_err(|_| CryptoError::TagMismatch(metric.name.clone()))?;

        let mut mac = keyed(secret)?;
        mac.update(metric.signing_payload().as_bytes());
        mac.verify_slice(&supplied)
            .map_err(|_| CryptoError::TagMismatch(metric.name.clone()))
    }
}

fn keyed(secret: &[u8]) -> Result<HmacSha256, CryptoError> {
    HmacSha256::new_from_slice(secret).map_err(|e| CryptoError::SigningKey(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metricsd_types::MetricValue;

    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let signer = Signer::new(Some("secret"));
        let mut gauge = Metric::gauge("Alloc", 2_128_506.0);
        let mut counter = Metric::counter("PollCount", 5);
        assert!(signer.sign(&mut gauge).is_ok());
        assert!(signer.sign(&mut counter).is_ok());
        assert!(signer.verify(&gauge).is_ok());
        assert!(signer.verify(&counter).is_ok());
    }

    #[test]
    fn known_tags_match_reference_values() {
        let signer = Signer::new(Some("key"));
        let tag = signer.compute(&Metric::counter("xyz", 10)).unwrap();
        assert_eq!(
            tag.as_deref(),
            Some("12707d0a4770c9d7d4a2b27b49e8f10319ab69f151475f85856711a59964f5f3")
        );

        let signer = Signer::new(Some("secret"));
        let tag = signer.compute(&Metric::gauge("Alloc", 2_128_506.0)).unwrap();
        assert_eq!(
            tag.as_deref(),
            Some("6f3c4f5eacdb588db52f9abda83ba7ab8ba179fb901cff8f4330d0350edcee2e")
        );
    }

    #[test]
    fn changed_field_fails_verification() {
        let signer = Signer::new(Some("secret"));
        let mut metric = Metric::counter("PollCount", 5);
        assert!(signer.sign(&mut metric).is_ok());
        metric.value = MetricValue::Counter(6);
        assert!(matches!(
            signer.verify(&metric),
            Err(CryptoError::TagMismatch(_))
        ));
    }

    #[test]
    fn different_key_fails_verification() {
        let mut metric = Metric::gauge("Alloc", 1.0);
        assert!(Signer::new(Some("one")).sign(&mut metric).is_ok());
        assert!(Signer::new(Some("two")).verify(&metric).is_err());
    }

    #[test]
    fn missing_or_garbage_tag_fails_when_enabled() {
        let signer = Signer::new(Some("secret"));
        let mut metric = Metric::gauge("Alloc", 1.0);
        assert!(matches!(
            signer.verify(&metric),
            Err(CryptoError::MissingTag(_))
        ));
        metric.tag = Some("not-hex".to_owned());
        assert!(matches!(
            signer.verify(&metric),
            Err(CryptoError::TagMismatch(_))
        ));
    }

    #[test]
    fn disabled_signer_is_a_no_op() {
        let signer = Signer::new(Some(""));
        assert!(!signer.is_enabled());
        let mut metric = Metric::gauge("Alloc", 1.0);
        assert!(signer.sign(&mut metric).is_ok());
        assert_eq!(metric.tag, None);
        assert!(signer.verify(&metric).is_ok());
    }
}
