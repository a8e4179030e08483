//! Error types for signing, key loading and the block envelope.

use std::path::PathBuf;

/// Errors that can occur in the integrity and confidentiality layer.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The metric carries no tag although a secret is configured.
    #[error("metric {0} is not signed")]
    MissingTag(String),

    /// The supplied tag does not match the recomputed one.
    #[error("hash value incorrect for metric {0}")]
    TagMismatch(String),

    /// The HMAC could not be keyed with the configured secret.
    #[error("invalid signing key: {0}")]
    SigningKey(String),

    /// A key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    KeyIo {
        /// Path of the key file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A key file is not a PEM-encoded RSA key of the expected half.
    #[error("failed to parse key: {0}")]
    KeyParse(String),

    /// The key is too small to carry any payload with SHA-256 OAEP.
    #[error("RSA key of {0} bytes is too small for OAEP with SHA-256")]
    KeyTooSmall(usize),

    /// Encrypting a block failed.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Decrypting a block failed, or the ciphertext is not block-aligned.
    #[error("decryption failed: {0}")]
    Decrypt(String),
}
