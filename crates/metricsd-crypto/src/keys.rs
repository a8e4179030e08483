//! PEM key loading.
//!
//! Key pairs are provisioned by an external tool. PKCS#1 (`RSA PRIVATE
//! KEY` / `RSA PUBLIC KEY`) is the primary format; PKCS#8 and SPKI are
//! accepted as a fallback.

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::envelope::{Decryptor, Encryptor};
use crate::error::CryptoError;

/// Parse a PEM private key.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|pkcs1_err| {
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|pkcs8_err| {
                CryptoError::KeyParse(format!("pkcs1: {pkcs1_err}; pkcs8: {pkcs8_err}"))
            })
        })
}

/// Parse a PEM public key.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_pkcs1_pem(pem)
        .or_else(|pkcs1_err| {
            RsaPublicKey::from_public_key_pem(pem).map_err(|spki_err| {
                CryptoError::KeyParse(format!("pkcs1: {pkcs1_err}; spki: {spki_err}"))
            })
        })
}

fn read(path: &Path) -> Result<String, CryptoError> {
    std::fs::read_to_string(path).map_err(|source| CryptoError::KeyIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the collector-side decryptor from a private key file.
pub fn load_decryptor(path: &Path) -> Result<Decryptor, CryptoError> {
    let decryptor = Decryptor::new(parse_private_key(&read(path)?)?)?;
    tracing::info!(path = %path.display(), "Loaded private key for body decryption");
    Ok(decryptor)
}

/// Load the sender-side encryptor from a public key file.
pub fn load_encryptor(path: &Path) -> Result<Encryptor, CryptoError> {
    let encryptor = Encryptor::new(parse_public_key(&read(path)?)?)?;
    tracing::info!(path = %path.display(), "Loaded public key for body encryption");
    Ok(encryptor)
}
