//! TRON address codec.
//!
//! A TRON address is 21 raw bytes: the `0x41` version byte followed by the
//! 20-byte account hash. Callers see it in Base58Check form (`T...`); node
//! APIs hand it out as 42-char hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version byte prefixed to every mainnet/testnet account hash.
pub const ADDRESS_VERSION: u8 = 0x41;

/// Length of the raw (binary) address form.
pub const RAW_ADDRESS_LEN: usize = 21;

/// Errors raised when an address fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid address length: expected {RAW_ADDRESS_LEN} bytes, got {0}")]
    Length(usize),

    #[error("invalid address version byte 0x{0:02x}")]
    Version(u8),

    #[error("invalid base58check encoding: {0}")]
    Base58(String),

    #[error("invalid hex encoding: {0}")]
    Hex(String),
}

/// A validated TRON address in raw form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TronAddress([u8; RAW_ADDRESS_LEN]);

impl TronAddress {
    /// Build an address from its 21-byte raw form.
    pub fn from_raw(raw: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; RAW_ADDRESS_LEN] = raw
            .try_into()
            .map_err(|_| AddressError::Length(raw.len()))?;
        if bytes[0] != ADDRESS_VERSION {
            return Err(AddressError::Version(bytes[0]));
        }
        Ok(Self(bytes))
    }

    /// Build an address from a bare 20-byte account hash (EVM-style word).
    pub fn from_account_hash(hash: [u8; 20]) -> Self {
        let mut bytes = [0u8; RAW_ADDRESS_LEN];
        bytes[0] = ADDRESS_VERSION;
        bytes[1..].copy_from_slice(&hash);
        Self(bytes)
    }

    /// Parse the `41...` hex form used by node APIs (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).map_err(|e| AddressError::Hex(e.to_string()))?;
        Self::from_raw(&raw)
    }

    /// Parse the canonical Base58Check form.
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        let raw = bs58::decode(s)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        Self::from_raw(&raw)
    }

    /// Returns true when `candidate` is a well-formed address in either form.
    pub fn is_valid(candidate: &str) -> bool {
        candidate.parse::<Self>().is_ok()
    }

    /// The 21-byte raw form.
    pub fn as_bytes(&self) -> &[u8; RAW_ADDRESS_LEN] {
        &self.0
    }

    /// The 20-byte account hash without the version byte.
    pub fn account_hash(&self) -> [u8; 20] {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[1..]);
        hash
    }

    /// Canonical Base58Check rendering.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Lowercase `41...` hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TronAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == RAW_ADDRESS_LEN * 2 || s.starts_with("0x") {
            Self::from_hex(s)
        } else {
            Self::from_base58(s)
        }
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TronAddress({})", self.to_base58())
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
