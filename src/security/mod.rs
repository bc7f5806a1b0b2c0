//! Key protection subsystem.
//!
//! # Data Flow
//! ```text
//! ENCRYPTION_KEY (env, 64 hex chars)
//!     → vault.rs (AES-256-GCM, fresh nonce per encryption)
//!     → keystore.rs (wallet key sealed with its derived TRON address)
//!     → external signer receives the unsealed key
//! ```
//!
//! # Security Constraints
//! - Master key ONLY from environment variables
//! - Decryption fails closed: no partial plaintext on any error
//! - Plaintext buffers are zeroized on drop

pub mod keystore;
pub mod vault;

pub use keystore::{KeystoreError, SealedKey};
pub use vault::{KeyVault, VaultError};
