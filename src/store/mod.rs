//! Transaction record storage.
//!
//! Every processed transaction is kept here keyed by id, in whatever state
//! it was last observed. The poller and reconciler write; the admin API and
//! startup recovery read.

pub mod records;

use crate::monitor::types::ProcessedTransaction;

pub use records::{RecordStore, StoreError};

/// Storage seam for processed transactions.
pub trait TransactionStore: Send + Sync {
    /// Insert or replace the record for `tx.tx_id`.
    fn upsert(&self, tx: &ProcessedTransaction);

    fn get(&self, tx_id: &str) -> Option<ProcessedTransaction>;

    /// Records whose last known status is PENDING.
    fn pending(&self) -> Vec<ProcessedTransaction>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist to durable storage, if any.
    fn flush(&self) -> Result<(), StoreError>;
}
