//! Fixed-block RSA-OAEP envelope for request bodies.
//!
//! Sender side splits the plaintext into blocks of
//! `key_bytes - 2 * 32 - 2` and OAEP-encrypts each one (SHA-256, empty
//! label). Receiver side splits the ciphertext into blocks of exactly
//! `key_bytes` and decrypts each one. Blocks are concatenated with no
//! length prefix on either side.

use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::CryptoError;

/// Output size of the OAEP hash (SHA-256).
pub const HASH_LEN: usize = 32;

/// Largest plaintext block that fits one OAEP operation for a key of
/// `key_bytes` bytes.
pub fn plaintext_block_len(key_bytes: usize) -> Result<usize, CryptoError> {
    key_bytes
        .checked_sub(2 * HASH_LEN + 2)
        .filter(|len| *len > 0)
        .ok_or(CryptoError::KeyTooSmall(key_bytes))
}

/// Encrypts bodies with the collector's public key.
#[derive(Debug, Clone)]
pub struct Encryptor {
    key: RsaPublicKey,
    block_len: usize,
}

impl Encryptor {
    /// Wrap a public key, rejecting keys too small for SHA-256 OAEP.
    pub fn new(key: RsaPublicKey) -> Result<Self, CryptoError> {
        let block_len = plaintext_block_len(key.size())?;
        Ok(Self { key, block_len })
    }

    /// Plaintext bytes consumed per ciphertext block.
    pub const fn block_len(&self) -> usize {
        self.block_len
    }

    /// Encrypt `plaintext` block by block. Empty input yields empty output.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let blocks = plaintext.len().div_ceil(self.block_len);
        let mut out = Vec::with_capacity(blocks.saturating_mul(self.key.size()));
        for chunk in plaintext.chunks(self.block_len) {
            let block = self
                .key
                .encrypt(&mut OsRng, Oaep::new::<Sha256>(), chunk)
                .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
            out.extend_from_slice(&block);
        }
        Ok(out)
    }
}

/// Decrypts bodies with the collector's private key.
#[derive(Debug, Clone)]
pub struct Decryptor {
    key: RsaPrivateKey,
}

impl Decryptor {
    /// Wrap a private key, rejecting keys too small for SHA-256 OAEP.
    pub fn new(key: RsaPrivateKey) -> Result<Self, CryptoError> {
        plaintext_block_len(key.size())?;
        Ok(Self { key })
    }

    /// Ciphertext bytes per block (the key size).
    pub fn block_len(&self) -> usize {
        self.key.size()
    }

    /// Decrypt a concatenation of ciphertext blocks.
    ///
    /// A trailing partial block is an error rather than being handed to
    /// OAEP, which would reject it anyway.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block_len = self.block_len();
        let chunks = ciphertext.chunks_exact(block_len);
        if !chunks.remainder().is_empty() {
            return Err(CryptoError::Decrypt(format!(
                "ciphertext length {} is not a multiple of {block_len}",
                ciphertext.len()
            )));
        }

        let mut out = Vec::with_capacity(ciphertext.len());
        for chunk in chunks {
            let block = self
                .key
                .decrypt(Oaep::new::<Sha256>(), chunk)
                .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
            out.extend_from_slice(&block);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    fn pair() -> (Encryptor, Decryptor) {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public = RsaPublicKey::from(&private);
        (
            Encryptor::new(public).unwrap(),
            Decryptor::new(private).unwrap(),
        )
    }

    #[test]
    fn block_len_is_derived_from_key_size() {
        assert_eq!(plaintext_block_len(128).unwrap(), 62);
        assert_eq!(plaintext_block_len(256).unwrap(), 190);
        assert!(plaintext_block_len(66).is_err());
    }

    #[test]
    fn round_trip_across_block_boundaries() {
        let (enc, dec) = pair();
        let step = enc.block_len();

        let lengths = [0, 1, step, step.saturating_mul(3).saturating_add(17)];
        for len in lengths {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ciphertext = enc.encrypt(&plaintext).unwrap();
            assert_eq!(ciphertext.len(), len.div_ceil(step) * dec.block_len());
            assert_eq!(dec.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let (enc, dec) = pair();
        let mut ciphertext = enc.encrypt(b"{\"id\":\"x\"}").unwrap();
        ciphertext.pop();
        assert!(matches!(
            dec.decrypt(&ciphertext),
            Err(CryptoError::Decrypt(_))
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let (enc, _) = pair();
        let (_, other) = pair();
        let ciphertext = enc.encrypt(b"payload").unwrap();
        assert!(other.decrypt(&ciphertext).is_err());
    }
}
