//! Registry of addresses under observation.

use dashmap::DashSet;

use crate::blockchain::address::TronAddress;
use crate::observability::metrics;

/// Concurrent set of watched addresses.
#[derive(Debug, Default)]
pub struct Watchlist {
    inner: DashSet<TronAddress>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from configured addresses, skipping invalid ones.
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watchlist = Self::new();
        for address in addresses {
            watchlist.add(address.as_ref());
        }
        watchlist
    }

    /// Watch `address`. False if it is not a valid TRON address; adding an
    /// address twice is harmless.
    pub fn add(&self, address: &str) -> bool {
        match address.parse::<TronAddress>() {
            Ok(parsed) => {
                self.add_address(parsed);
                true
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "Rejected invalid watch address");
                false
            }
        }
    }

    /// Watch an already-validated address. Returns true if it was new.
    pub fn add_address(&self, address: TronAddress) -> bool {
        let inserted = self.inner.insert(address);
        if inserted {
            tracing::info!(address = %address, "Added watch address");
            metrics::set_watchlist_size(self.inner.len());
        }
        inserted
    }

    /// Stop watching `address`. True iff it was present.
    pub fn remove(&self, address: &str) -> bool {
        let Ok(parsed) = address.parse::<TronAddress>() else {
            return false;
        };
        let removed = self.inner.remove(&parsed).is_some();
        if removed {
            tracing::info!(address = %parsed, "Removed watch address");
            metrics::set_watchlist_size(self.inner.len());
        }
        removed
    }

    pub fn contains(&self, address: &TronAddress) -> bool {
        self.inner.contains(address)
    }

    /// Membership test from either textual form.
    pub fn contains_str(&self, address: &str) -> bool {
        address
            .parse::<TronAddress>()
            .map(|a| self.contains(&a))
            .unwrap_or(false)
    }

    /// Watched addresses in canonical form, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.inner.iter().map(|a| a.to_base58()).collect();
        addresses.sort();
        addresses
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
