//! Wallet private keys sealed by the key vault.
//!
//! # Security
//! - Plaintext keys exist only inside [`SealedKey::seal`] and the signer
//!   returned by [`SealedKey::unseal`]
//! - Keys are never logged or serialized in the clear

use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::blockchain::address::TronAddress;
use crate::security::vault::{KeyVault, VaultError};

/// Errors raised while sealing or opening a wallet key.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The decrypted key no longer derives the stored address.
    #[error("Sealed key belongs to {actual}, expected {expected}")]
    AddressMismatch {
        expected: TronAddress,
        actual: TronAddress,
    },
}

/// A wallet key encrypted at rest, with the address it controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedKey {
    pub address: TronAddress,
    /// Hex vault blob of the hex private key.
    pub encrypted_private_key: String,
}

impl SealedKey {
    /// Encrypt a hex private key (with or without `0x`).
    pub fn seal(private_key_hex: &str, vault: &KeyVault) -> Result<Self, KeystoreError> {
        let key_hex = Zeroizing::new(
            private_key_hex
                .trim()
                .trim_start_matches("0x")
                .to_ascii_lowercase(),
        );
        let signer = parse_signer(&key_hex)?;
        let address = tron_address_of(&signer);

        let encrypted_private_key = vault.encrypt_hex(key_hex.as_bytes())?;

        tracing::info!(address = %address, "Wallet key sealed");
        Ok(Self {
            address,
            encrypted_private_key,
        })
    }

    /// Decrypt the key into a signer for an external transfer builder.
    pub fn unseal(&self, vault: &KeyVault) -> Result<PrivateKeySigner, KeystoreError> {
        let plaintext = vault.decrypt_hex(&self.encrypted_private_key)?;
        let key_hex = std::str::from_utf8(&plaintext)
            .map_err(|_| KeystoreError::InvalidKey("sealed key is not utf-8".into()))?;
        let signer = parse_signer(key_hex)?;

        let actual = tron_address_of(&signer);
        if actual != self.address {
            return Err(KeystoreError::AddressMismatch {
                expected: self.address,
                actual,
            });
        }
        Ok(signer)
    }
}

/// The TRON address controlled by a secp256k1 signer.
pub fn tron_address_of(signer: &PrivateKeySigner) -> TronAddress {
    TronAddress::from_account_hash(signer.address().into_array())
}

fn parse_signer(key_hex: &str) -> Result<PrivateKeySigner, KeystoreError> {
    key_hex
        .parse::<PrivateKeySigner>()
        .map_err(|e| KeystoreError::InvalidKey(e.to_string()))
}
