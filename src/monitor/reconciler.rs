//! Periodic re-check of transactions still awaiting a terminal status.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::TransactionStatus;
use crate::lifecycle::task::{guarded, run_every, TaskSlot};
use crate::monitor::pending::PendingSet;
use crate::monitor::publisher::EventPublisher;
use crate::store::TransactionStore;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Entries whose status was queried.
    pub checked: usize,
    /// Entries that reached SUCCESS or FAILED and left the pending set.
    pub resolved: usize,
    /// Stored PENDING records brought back into the pending set.
    pub readmitted: usize,
    /// Status queries that failed and will be retried.
    pub failed: usize,
}

struct ReconcilerInner {
    rpc: Arc<dyn ChainRpc>,
    pending: Arc<PendingSet>,
    store: Arc<dyn TransactionStore>,
    publisher: EventPublisher,
    sweep_lock: tokio::sync::Mutex<()>,
}

/// Resolves pending transactions on its own interval, independent of the
/// poller.
pub struct PendingReconciler {
    inner: Arc<ReconcilerInner>,
    interval: Duration,
    slot: TaskSlot,
}

impl PendingReconciler {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        pending: Arc<PendingSet>,
        store: Arc<dyn TransactionStore>,
        publisher: EventPublisher,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                rpc,
                pending,
                store,
                publisher,
                sweep_lock: tokio::sync::Mutex::new(()),
            }),
            interval,
            slot: TaskSlot::new(),
        }
    }

    /// Start the sweep loop. Returns false if it is already running.
    pub fn start(&self) -> bool {
        let inner = self.inner.clone();
        let interval = self.interval;
        self.slot.start(move |stop| run(inner, interval, stop))
    }

    pub async fn stop(&self) {
        self.slot.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    /// Run one sweep now.
    pub async fn reconcile_once(&self) -> ReconcileOutcome {
        self.inner.reconcile_once().await
    }
}

async fn run(inner: Arc<ReconcilerInner>, interval: Duration, stop: watch::Receiver<bool>) {
    tracing::info!(interval_ms = interval.as_millis() as u64, "Pending reconciler running");

    run_every(interval, stop, || {
        let inner = inner.clone();
        async move {
            guarded("pending-reconciler", async {
                let outcome = inner.reconcile_once().await;
                if outcome.resolved > 0 || outcome.readmitted > 0 || outcome.failed > 0 {
                    tracing::debug!(
                        checked = outcome.checked,
                        resolved = outcome.resolved,
                        readmitted = outcome.readmitted,
                        failed = outcome.failed,
                        "Reconcile sweep complete"
                    );
                }
            })
            .await
        }
    })
    .await;

    tracing::info!("Pending reconciler stopped");
}

impl ReconcilerInner {
    async fn reconcile_once(&self) -> ReconcileOutcome {
        let _sweep = self.sweep_lock.lock().await;
        let mut outcome = ReconcileOutcome::default();

        // Records persisted as PENDING but not tracked in memory, e.g. after a restart
        for record in self.store.pending() {
            if self.pending.admit(record) {
                outcome.readmitted += 1;
            }
        }

        for entry in self.pending.snapshot() {
            outcome.checked += 1;

            let report = match self.rpc.transaction_status(&entry.tx_id).await {
                Ok(report) => report,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(tx_id = %entry.tx_id, error = %e, "Status lookup failed; retrying next sweep");
                    continue;
                }
            };

            if !TransactionStatus::from(report.as_ref()).is_terminal() {
                continue;
            }

            // Whoever removes the entry owns its terminal transition
            let Some(mut resolved) = self.pending.remove(&entry.tx_id) else {
                continue;
            };
            resolved.apply_status(report.as_ref());
            self.store.upsert(&resolved);
            self.publisher.publish(&resolved);
            outcome.resolved += 1;

            tracing::info!(
                tx_id = %resolved.tx_id,
                status = %resolved.status,
                block = ?resolved.block_number,
                error = ?resolved.error,
                "Transaction reached terminal status"
            );
        }

        if outcome.resolved > 0 {
            if let Err(e) = self.store.flush() {
                tracing::error!(error = %e, "Failed to persist transaction records");
            }
        }

        outcome
    }
}
