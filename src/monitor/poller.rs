//! Block scanner.
//!
//! # State machine
//! ```text
//! STOPPED ──start()──▶ STARTING (fetch head, set cursor) ──▶ RUNNING (fixed tick)
//!    ▲                                                            │
//!    └────────────────────────────stop()──────────────────────────┘
//! ```
//!
//! Each tick scans `(cursor, head]` in ascending order and advances the
//! cursor only once the whole range is processed. Re-scanning a block is
//! harmless: records are keyed by transaction id and overwritten in place.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::watch;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{ChainBlock, RpcError, TransactionStatus};
use crate::config::MonitorConfig;
use crate::lifecycle::task::{guarded, run_every, sleep_or_stop, TaskSlot};
use crate::monitor::pending::PendingSet;
use crate::monitor::processor::{match_transaction, TransferFilter};
use crate::monitor::publisher::EventPublisher;
use crate::monitor::types::ProcessedTransaction;
use crate::monitor::watchlist::Watchlist;
use crate::observability::metrics;
use crate::resilience::calculate_backoff;
use crate::store::TransactionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollerState {
    Stopped,
    Starting,
    Running,
}

/// Result of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Blocks fully processed.
    pub blocks: u64,
    /// Transfers that touched a watched address.
    pub matches: usize,
}

/// Timing and batching knobs, taken from [`MonitorConfig`].
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub max_blocks_per_tick: u64,
    pub start_height: Option<u64>,
    pub startup_backoff_ms: u64,
    pub startup_backoff_max_ms: u64,
}

impl From<&MonitorConfig> for PollerSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_blocks_per_tick: config.max_blocks_per_tick.max(1),
            start_height: config.start_height,
            startup_backoff_ms: config.startup_backoff_ms,
            startup_backoff_max_ms: config.startup_backoff_max_ms,
        }
    }
}

struct PollerInner {
    rpc: Arc<dyn ChainRpc>,
    watchlist: Arc<Watchlist>,
    pending: Arc<PendingSet>,
    store: Arc<dyn TransactionStore>,
    publisher: EventPublisher,
    filter: TransferFilter,
    settings: PollerSettings,
    /// Highest fully processed height.
    cursor: RwLock<Option<u64>>,
    /// Serializes scans so ticks and manual polls never interleave.
    tick_lock: tokio::sync::Mutex<()>,
    state: Mutex<PollerState>,
}

/// Periodic chain scanner feeding the pending set and event publisher.
pub struct ChainPoller {
    inner: Arc<PollerInner>,
    slot: TaskSlot,
}

impl ChainPoller {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        watchlist: Arc<Watchlist>,
        pending: Arc<PendingSet>,
        store: Arc<dyn TransactionStore>,
        publisher: EventPublisher,
        filter: TransferFilter,
        settings: PollerSettings,
    ) -> Self {
        let cursor = RwLock::new(settings.start_height);
        Self {
            inner: Arc::new(PollerInner {
                rpc,
                watchlist,
                pending,
                store,
                publisher,
                filter,
                settings,
                cursor,
                tick_lock: tokio::sync::Mutex::new(()),
                state: Mutex::new(PollerState::Stopped),
            }),
            slot: TaskSlot::new(),
        }
    }

    /// Start the background scan. Returns false if it is already running.
    pub fn start(&self) -> bool {
        let inner = self.inner.clone();
        self.slot.start(move |stop| {
            inner.set_state(PollerState::Starting);
            run(inner, stop)
        })
    }

    /// Stop scanning. A tick already in progress completes first.
    pub async fn stop(&self) {
        self.slot.stop().await;
        self.inner.set_state(PollerState::Stopped);
    }

    pub fn state(&self) -> PollerState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Highest fully processed block, if scanning has begun.
    pub fn cursor(&self) -> Option<u64> {
        self.inner.cursor()
    }

    /// Run a single scan now.
    ///
    /// With no cursor yet, this only records the current head.
    pub async fn poll_once(&self) -> Result<PollOutcome, RpcError> {
        self.inner.poll_once().await
    }
}

async fn run(inner: Arc<PollerInner>, mut stop: watch::Receiver<bool>) {
    if inner.cursor().is_none() {
        let mut attempt = 0u32;
        loop {
            match inner.rpc.current_height().await {
                Ok(height) => {
                    inner.advance_cursor(height);
                    break;
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    let delay = calculate_backoff(
                        attempt,
                        inner.settings.startup_backoff_ms,
                        inner.settings.startup_backoff_max_ms,
                    );
                    tracing::warn!(
                        error = %e,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "Failed to fetch chain height at startup"
                    );
                    if !sleep_or_stop(delay, &mut stop).await {
                        inner.set_state(PollerState::Stopped);
                        return;
                    }
                }
            }
        }
    }

    tracing::info!(
        cursor = ?inner.cursor(),
        interval_ms = inner.settings.poll_interval.as_millis() as u64,
        watched = inner.watchlist.len(),
        "Chain poller running"
    );
    inner.set_state(PollerState::Running);

    let period = inner.settings.poll_interval;
    run_every(period, stop, || {
        let inner = inner.clone();
        async move {
            guarded("chain-poller", async {
                match inner.poll_once().await {
                    Ok(outcome) if outcome.blocks > 0 => tracing::debug!(
                        blocks = outcome.blocks,
                        matches = outcome.matches,
                        cursor = ?inner.cursor(),
                        "Scan complete"
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        error = %e,
                        cursor = ?inner.cursor(),
                        "Scan failed; retrying next tick"
                    ),
                }
            })
            .await
        }
    })
    .await;

    inner.set_state(PollerState::Stopped);
    tracing::info!(cursor = ?inner.cursor(), "Chain poller stopped");
}

impl PollerInner {
    fn set_state(&self, state: PollerState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn cursor(&self) -> Option<u64> {
        *self.cursor.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the cursor forward. Never moves it back.
    fn advance_cursor(&self, height: u64) {
        let mut cursor = self.cursor.write().unwrap_or_else(|e| e.into_inner());
        let next = cursor.map_or(height, |current| current.max(height));
        *cursor = Some(next);
        metrics::set_scan_cursor(next);
    }

    async fn poll_once(&self) -> Result<PollOutcome, RpcError> {
        let _tick = self.tick_lock.lock().await;

        let head = self.rpc.current_height().await?;
        let Some(cursor) = self.cursor() else {
            self.advance_cursor(head);
            tracing::info!(height = head, "Scan cursor initialized at chain head");
            return Ok(PollOutcome::default());
        };

        if head <= cursor {
            return Ok(PollOutcome::default());
        }

        let end = head.min(cursor.saturating_add(self.settings.max_blocks_per_tick));
        let mut outcome = PollOutcome::default();

        for height in cursor + 1..=end {
            let block = self.rpc.block(height).await?;
            outcome.matches += self.process_block(height, &block).await;
            outcome.blocks += 1;
        }

        self.advance_cursor(end);
        metrics::record_blocks_scanned(outcome.blocks);

        if outcome.matches > 0 {
            if let Err(e) = self.store.flush() {
                tracing::error!(error = %e, "Failed to persist transaction records");
            }
        }

        Ok(outcome)
    }

    async fn process_block(&self, height: u64, block: &ChainBlock) -> usize {
        let mut matched = 0;
        for tx in &block.transactions {
            for record in match_transaction(tx, height, &self.watchlist, &self.filter) {
                self.track(record).await;
                matched += 1;
            }
        }
        matched
    }

    async fn track(&self, mut record: ProcessedTransaction) {
        let report = match self.rpc.transaction_status(&record.tx_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(tx_id = %record.tx_id, error = %e, "Status lookup failed; treating as pending");
                None
            }
        };
        record.apply_status(report.as_ref());

        // A re-scan must not undo or repeat a terminal transition
        if let Some(stored) = self.store.get(&record.tx_id) {
            if stored.status.is_terminal() {
                tracing::debug!(
                    tx_id = %record.tx_id,
                    status = %stored.status,
                    "Transaction already final; keeping stored record"
                );
                return;
            }
        }

        tracing::info!(
            tx_id = %record.tx_id,
            block = ?record.block_number,
            from = %record.sender,
            to = %record.recipient,
            amount = record.amount,
            status = %record.status,
            "Matched watched transfer"
        );

        if record.status == TransactionStatus::Pending {
            self.pending.upsert(record.clone());
        }
        self.store.upsert(&record);
        metrics::record_match(record.asset_kind.as_str());
        self.publisher.publish(&record);
    }
}
