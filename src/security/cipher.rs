//! AES-256-GCM sealing of artifact bytes.
//!
//! ## Blob layout:
//! ```text
//! +---------+-----------------+---------------------------+
//! | version | nonce (12 bytes)| ciphertext || tag (16 B)  |
//! +---------+-----------------+---------------------------+
//! ```
//! A fresh random nonce is drawn for every call, so sealing the same audio
//! twice yields two different blobs.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::config::SecurityConfig;

const FORMAT_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = 1 + NONCE_LEN;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("invalid cipher key: {0}")]
    InvalidKey(String),
    #[error("encryption failed")]
    EncryptionFailed,
    /// Wrong key, modified bytes, truncation or an unknown format version.
    #[error("ciphertext failed integrity check")]
    Integrity,
}

/// Holds the process's symmetric key.
///
/// A `Cipher` cannot exist without a key, so every encrypt/decrypt call is
/// guaranteed to run under one. The key is immutable after construction,
/// which makes the value safe to share across request handlers behind an `Arc`.
pub struct Cipher {
    aead: Aes256Gcm,
    ephemeral: bool,
}

impl Cipher {
    /// Generate a fresh key from the operating system RNG.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self {
            aead: Aes256Gcm::new(&key),
            ephemeral: true,
        }
    }

    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Ok(Self {
            aead: Aes256Gcm::new(key),
            ephemeral: false,
        })
    }

    /// Use the injected key when configured, otherwise generate one.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, CipherError> {
        match config.cipher_key.as_deref() {
            Some(encoded) => Self::from_base64(encoded),
            None => Ok(Self::generate()),
        }
    }

    /// True when the key was generated by this process and dies with it.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(HEADER_LEN + sealed.len());
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < HEADER_LEN + TAG_LEN || blob[0] != FORMAT_VERSION {
            return Err(CipherError::Integrity);
        }
        let (nonce, sealed) = blob[1..].split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Integrity)
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}
