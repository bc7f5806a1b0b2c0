//! Authenticated encryption of private key material at rest.
//!
//! Blob layout: `nonce (16) ‖ ciphertext ‖ tag (16)`, AES-256-GCM under a
//! single 32-byte master key. Every call to [`KeyVault::encrypt`] draws a
//! fresh random nonce from the OS RNG.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use thiserror::Error;
use zeroize::Zeroizing;

/// Master key length in bytes.
pub const KEY_LEN: usize = 32;
/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;
/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

type VaultCipher = AesGcm<Aes256, U16>;

/// Errors raised by the vault. Never retried: the same input fails the same way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Master key absent, not hex, or not 32 bytes.
    #[error("vault configuration error: {0}")]
    Configuration(String),

    #[error("encryption failed")]
    Encryption,

    /// Tag mismatch, wrong key, truncated or non-hex blob.
    #[error("decryption failed: {0}")]
    Decryption(&'static str),
}

/// AES-256-GCM vault holding the master key.
#[derive(Clone)]
pub struct KeyVault {
    cipher: VaultCipher,
}

impl KeyVault {
    /// Build a vault from raw key bytes.
    pub fn new(key: &[u8]) -> Result<Self, VaultError> {
        if key.len() != KEY_LEN {
            return Err(VaultError::Configuration(format!(
                "encryption key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        let cipher = VaultCipher::new_from_slice(key)
            .map_err(|e| VaultError::Configuration(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Build a vault from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, VaultError> {
        let key_hex = key_hex.trim();
        if key_hex.is_empty() {
            return Err(VaultError::Configuration("encryption key is empty".into()));
        }
        let key = Zeroizing::new(
            hex::decode(key_hex)
                .map_err(|e| VaultError::Configuration(format!("encryption key is not hex: {}", e)))?,
        );
        Self::new(&key)
    }

    /// Load the master key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, VaultError> {
        let key_hex = Zeroizing::new(std::env::var(var).map_err(|_| {
            VaultError::Configuration(format!("environment variable {} not set", var))
        })?);
        Self::from_hex(&key_hex)
    }

    /// Generate a fresh random master key, hex-encoded.
    pub fn generate_key_hex() -> Zeroizing<String> {
        let key = VaultCipher::generate_key(&mut OsRng);
        Zeroizing::new(hex::encode(key))
    }

    /// Encrypt `plaintext` under a fresh nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = VaultCipher::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Verify and decrypt a blob produced by [`KeyVault::encrypt`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Decryption("blob truncated"));
        }
        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::<U16>::from_slice(nonce), sealed)
            .map_err(|_| VaultError::Decryption("authentication failed"))?;
        Ok(Zeroizing::new(plaintext))
    }

    /// Encrypt and hex-encode, the at-rest representation.
    pub fn encrypt_hex(&self, plaintext: &[u8]) -> Result<String, VaultError> {
        self.encrypt(plaintext).map(hex::encode)
    }

    /// Decode and decrypt a hex blob.
    pub fn decrypt_hex(&self, blob_hex: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let blob = hex::decode(blob_hex.trim()).map_err(|_| VaultError::Decryption("blob is not hex"))?;
        self.decrypt(&blob)
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault").field("cipher", &"AES-256-GCM").finish_non_exhaustive()
    }
}
