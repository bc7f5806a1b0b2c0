//! In-memory record store with optional JSON persistence.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::blockchain::types::TransactionStatus;
use crate::monitor::types::ProcessedTransaction;
use crate::store::TransactionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Thread-safe record map. When a path is set, [`flush`](TransactionStore::flush)
/// writes the whole map to it as JSON.
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: DashMap<String, ProcessedTransaction>,
    persistence_path: Option<PathBuf>,
}

impl RecordStore {
    /// Create an empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading it if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            inner: DashMap::new(),
            persistence_path: Some(path.clone()),
        };

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let records: BTreeMap<String, ProcessedTransaction> = serde_json::from_reader(reader)?;
            for (id, record) in records {
                store.inner.insert(id, record);
            }
            tracing::info!(
                path = %path.display(),
                records = store.inner.len(),
                "Loaded transaction records"
            );
        }

        Ok(store)
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence_path.as_deref()
    }
}

impl TransactionStore for RecordStore {
    fn upsert(&self, tx: &ProcessedTransaction) {
        self.inner.insert(tx.tx_id.clone(), tx.clone());
    }

    fn get(&self, tx_id: &str) -> Option<ProcessedTransaction> {
        self.inner.get(tx_id).map(|r| r.value().clone())
    }

    fn pending(&self) -> Vec<ProcessedTransaction> {
        let mut pending: Vec<_> = self
            .inner
            .iter()
            .filter(|r| r.value().status == TransactionStatus::Pending)
            .map(|r| r.value().clone())
            .collect();
        pending.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.tx_id.cmp(&b.tx_id)));
        pending
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let records: BTreeMap<_, _> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        // Write beside the target and rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &records)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), records = records.len(), "Saved transaction records");
        Ok(())
    }
}
