//! In-memory set of transactions still awaiting a terminal status.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::monitor::types::ProcessedTransaction;
use crate::observability::metrics;

/// Transactions in PENDING, keyed by transaction id.
///
/// Each mutation replaces or removes a whole entry under the map's shard
/// lock, so readers never see a half-updated record.
#[derive(Debug, Default)]
pub struct PendingSet {
    inner: DashMap<String, ProcessedTransaction>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by transaction id. Returns true if the id was new.
    pub fn upsert(&self, tx: ProcessedTransaction) -> bool {
        let is_new = self.inner.insert(tx.tx_id.clone(), tx).is_none();
        metrics::set_pending_size(self.inner.len());
        is_new
    }

    /// Insert only if the id is absent. Returns true if inserted.
    pub fn admit(&self, tx: ProcessedTransaction) -> bool {
        let admitted = match self.inner.entry(tx.tx_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(tx);
                true
            }
        };
        if admitted {
            metrics::set_pending_size(self.inner.len());
        }
        admitted
    }

    /// Remove an entry. Only one caller can ever receive a given entry.
    pub fn remove(&self, tx_id: &str) -> Option<ProcessedTransaction> {
        let removed = self.inner.remove(tx_id).map(|(_, tx)| tx);
        metrics::set_pending_size(self.inner.len());
        removed
    }

    pub fn get(&self, tx_id: &str) -> Option<ProcessedTransaction> {
        self.inner.get(tx_id).map(|r| r.value().clone())
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.inner.contains_key(tx_id)
    }

    /// Ids currently pending.
    pub fn ids(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    /// Copy of every entry, ordered by timestamp.
    pub fn snapshot(&self) -> Vec<ProcessedTransaction> {
        let mut entries: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.tx_id.cmp(&b.tx_id)));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
