//! Fan-out of transaction events to in-process subscribers.

use tokio::sync::broadcast;

use crate::lifecycle::Shutdown;
use crate::monitor::types::{ProcessedTransaction, TransactionEvent};
use crate::observability::metrics;

/// Typed publish/subscribe channel for [`TransactionEvent`]s.
///
/// Publishing never blocks: each subscriber has a bounded buffer and a slow
/// subscriber loses its oldest events instead of stalling the monitor.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<TransactionEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransactionEvent> {
        self.tx.subscribe()
    }

    /// Publish the current state of `record`. Returns how many subscribers
    /// received it.
    pub fn publish(&self, record: &ProcessedTransaction) -> usize {
        let event = TransactionEvent::from(record);
        metrics::record_status_event(event.status.as_str());
        // No subscribers is not an error
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Log every event until shutdown. Runs as its own subscriber.
pub async fn log_events(publisher: EventPublisher, shutdown: Shutdown) {
    let mut events = publisher.subscribe();
    let mut stop = shutdown.subscribe();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => tracing::info!(
                    tx_id = %event.transaction_id,
                    status = %event.status,
                    from = %event.sender,
                    to = %event.recipient,
                    amount = event.amount,
                    asset = ?event.asset_kind,
                    block = ?event.block_number,
                    error = ?event.error,
                    "Transaction update"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagging; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = stop.recv() => break,
        }
    }
}
