//! Integrity and confidentiality layer for metricsd.
//!
//! - [`signing`] -- HMAC-SHA256 tags over the canonical metric string.
//!   Both operations succeed as no-ops when no shared secret is set.
//! - [`envelope`] -- Fixed-block RSA-OAEP (SHA-256) encryption of request
//!   bodies. This is a closed, versionless wire format: the block size is
//!   derived from the key size on both sides and ciphertext blocks are
//!   concatenated without framing, so changing the key size breaks every
//!   ciphertext produced with the old key.
//! - [`keys`] -- PEM loading of the half of the key pair each side needs.

pub mod envelope;
pub mod error;
pub mod keys;
pub mod signing;

pub use envelope::{Decryptor, Encryptor};
pub use error::CryptoError;
pub use keys::{load_decryptor, load_encryptor};
pub use signing::Signer;
