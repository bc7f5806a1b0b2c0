//! End-to-end monitor behaviour against a scripted node.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use tron_watch::blockchain::{ChainRpc, TransactionStatus};
use tron_watch::config::WatchConfig;
use tron_watch::monitor::{
    ChainPoller, EventPublisher, PendingReconciler, PendingSet, PollOutcome, PollerSettings,
    PollerState, TransactionEvent, TransferFilter, Watchlist,
};
use tron_watch::security::KeyVault;
use tron_watch::store::{RecordStore, TransactionStore};
use tron_watch::WatchService;

mod common;
use common::{failure, native_transfer, success, MockChain, UNWATCHED, WATCHED};

fn test_config() -> WatchConfig {
    let mut config = WatchConfig::default();
    config.monitor.watch_addresses = vec![WATCHED.to_string()];
    config.monitor.poll_interval_ms = 20;
    config.reconciler.interval_ms = 20;
    config
}

fn vault() -> KeyVault {
    KeyVault::from_hex(&KeyVault::generate_key_hex()).unwrap()
}

fn service(chain: Arc<MockChain>, config: WatchConfig) -> WatchService {
    WatchService::with_rpc(config, chain, vault()).unwrap()
}

fn drain(rx: &mut broadcast::Receiver<TransactionEvent>) -> Vec<TransactionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_native_transfer_scenario() {
    let chain = Arc::new(MockChain::at_height(1000));
    let service = service(chain.clone(), test_config());
    let mut events = service.publisher().subscribe();

    // First poll only anchors the cursor at the head
    assert_eq!(service.poller().poll_once().await.unwrap(), PollOutcome::default());
    assert_eq!(service.poller().cursor(), Some(1000));

    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 5_000_000)]);
    chain.set_height(1001);

    let outcome = service.poller().poll_once().await.unwrap();
    assert_eq!(outcome, PollOutcome { blocks: 1, matches: 1 });
    assert_eq!(service.poller().cursor(), Some(1001));

    let first = drain(&mut events);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].transaction_id, "tx1");
    assert_eq!(first[0].status, TransactionStatus::Pending);
    assert_eq!(first[0].amount, 5.0);
    assert_eq!(first[0].sender.to_base58(), WATCHED);
    assert_eq!(first[0].recipient.to_base58(), UNWATCHED);
    assert!(service.pending().contains("tx1"));

    chain.set_status("tx1", success(1001));
    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!(outcome.resolved, 1);

    let second = drain(&mut events);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].status, TransactionStatus::Success);
    assert!(!service.pending().contains("tx1"));
    assert_eq!(service.store().get("tx1").unwrap().status, TransactionStatus::Success);
}

#[tokio::test]
async fn test_reprocessing_block_does_not_duplicate() {
    let chain = Arc::new(MockChain::at_height(1001));
    chain.add_block(1001, vec![native_transfer("tx1", UNWATCHED, WATCHED, 1_000_000)]);

    let watchlist = Arc::new(Watchlist::from_addresses([WATCHED]));
    let pending = Arc::new(PendingSet::new());
    let store: Arc<dyn TransactionStore> = Arc::new(RecordStore::new());
    let publisher = EventPublisher::new(16);
    let mut settings = PollerSettings::from(&test_config().monitor);
    settings.start_height = Some(1000);

    // Two pollers resuming from the same cursor simulate a restart
    for _ in 0..2 {
        let poller = ChainPoller::new(
            chain.clone(),
            watchlist.clone(),
            pending.clone(),
            store.clone(),
            publisher.clone(),
            TransferFilter::default(),
            settings.clone(),
        );
        assert_eq!(poller.poll_once().await.unwrap().matches, 1);
    }

    assert_eq!(pending.len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_reconciliation_terminates_once() {
    let chain = Arc::new(MockChain::at_height(1000));
    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);
    let mut events = service.publisher().subscribe();

    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 2_000_000)]);
    chain.set_height(1001);
    service.poller().poll_once().await.unwrap();
    drain(&mut events);

    // Not yet executed
    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!((outcome.checked, outcome.resolved), (1, 0));
    assert!(drain(&mut events).is_empty());

    chain.set_status("tx1", failure(1002, "REVERT opcode executed"));
    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!(outcome.resolved, 1);

    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!(outcome.checked, 0);

    let terminal = drain(&mut events);
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].status, TransactionStatus::Failed);
    assert_eq!(terminal[0].error.as_deref(), Some("REVERT opcode executed"));
    assert!(service.pending().is_empty());
}

#[tokio::test]
async fn test_rescan_keeps_terminal_status() {
    let chain = Arc::new(MockChain::at_height(1001));
    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 3_000_000)]);

    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);
    let mut events = service.publisher().subscribe();

    service.poller().poll_once().await.unwrap();
    chain.set_status("tx1", success(1001));
    assert_eq!(service.reconciler().reconcile_once().await.resolved, 1);

    // Restart from the same height while the node cannot answer status lookups
    let mut settings = PollerSettings::from(&test_config().monitor);
    settings.start_height = Some(1000);
    let restarted = ChainPoller::new(
        chain.clone(),
        service.watchlist().clone(),
        service.pending().clone(),
        service.store().clone(),
        service.publisher().clone(),
        TransferFilter::default(),
        settings,
    );
    chain.fail_status(true);
    restarted.poll_once().await.unwrap();
    chain.fail_status(false);

    assert_eq!(service.store().get("tx1").unwrap().status, TransactionStatus::Success);
    assert!(service.pending().is_empty());

    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!((outcome.readmitted, outcome.resolved), (0, 0));

    let terminal = drain(&mut events)
        .into_iter()
        .filter(|e| e.transaction_id == "tx1" && e.status.is_terminal())
        .count();
    assert_eq!(terminal, 1);
}

#[tokio::test]
async fn test_failed_status_lookup_leaves_entry() {
    let chain = Arc::new(MockChain::at_height(1000));
    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);

    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 1)]);
    chain.set_height(1001);
    service.poller().poll_once().await.unwrap();

    chain.set_status("tx1", success(1001));
    chain.fail_status(true);
    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!((outcome.failed, outcome.resolved), (1, 0));
    assert!(service.pending().contains("tx1"));

    chain.fail_status(false);
    assert_eq!(service.reconciler().reconcile_once().await.resolved, 1);
}

#[tokio::test]
async fn test_empty_sweep_is_noop() {
    let chain = Arc::new(MockChain::at_height(1000));
    let service = service(chain.clone(), test_config());
    let outcome = service.reconciler().reconcile_once().await;
    assert_eq!(outcome.checked, 0);
    assert_eq!(chain.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cursor_not_advanced_on_block_failure() {
    let chain = Arc::new(MockChain::at_height(1003));
    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 1)]);
    chain.fail_block(1002, true);

    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);

    assert!(service.poller().poll_once().await.is_err());
    assert_eq!(service.poller().cursor(), Some(1000));

    chain.fail_block(1002, false);
    let outcome = service.poller().poll_once().await.unwrap();
    assert_eq!(outcome.blocks, 3);
    assert_eq!(service.poller().cursor(), Some(1003));
    assert_eq!(service.pending().len(), 1);
}

#[tokio::test]
async fn test_cursor_not_advanced_on_height_failure() {
    let chain = Arc::new(MockChain::at_height(1005));
    chain.fail_height(true);
    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);

    assert!(service.poller().poll_once().await.is_err());
    assert_eq!(service.poller().cursor(), Some(1000));
}

#[tokio::test]
async fn test_catch_up_is_batched() {
    let chain = Arc::new(MockChain::at_height(1010));
    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    config.monitor.max_blocks_per_tick = 4;
    let service = service(chain.clone(), config);

    assert_eq!(service.poller().poll_once().await.unwrap().blocks, 4);
    assert_eq!(service.poller().cursor(), Some(1004));
    service.poller().poll_once().await.unwrap();
    service.poller().poll_once().await.unwrap();
    assert_eq!(service.poller().cursor(), Some(1010));
}

#[tokio::test]
async fn test_terminal_at_first_sight_skips_pending() {
    let chain = Arc::new(MockChain::at_height(1001));
    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 1)]);
    chain.set_status("tx1", success(1001));

    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    let service = service(chain.clone(), config);
    let mut events = service.publisher().subscribe();

    service.poller().poll_once().await.unwrap();
    assert!(service.pending().is_empty());
    let published = drain(&mut events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].status, TransactionStatus::Success);
}

#[tokio::test]
async fn test_stored_pending_records_are_readmitted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");

    let chain = Arc::new(MockChain::at_height(1001));
    chain.add_block(1001, vec![native_transfer("tx1", WATCHED, UNWATCHED, 1)]);

    let mut config = test_config();
    config.monitor.start_height = Some(1000);
    config.store.path = Some(path.to_string_lossy().into_owned());

    {
        let first = service(chain.clone(), config.clone());
        first.poller().poll_once().await.unwrap();
        first.stop().await;
    }

    let restarted = service(chain.clone(), config);
    assert!(restarted.pending().is_empty());
    let outcome = restarted.reconciler().reconcile_once().await;
    assert_eq!(outcome.readmitted, 1);
    assert!(restarted.pending().contains("tx1"));

    chain.set_status("tx1", success(1001));
    assert_eq!(restarted.reconciler().reconcile_once().await.resolved, 1);
    assert_eq!(restarted.reconciler().reconcile_once().await.readmitted, 0);
}

#[tokio::test]
async fn test_start_twice_and_stop() {
    let chain = Arc::new(MockChain::at_height(1000));
    let service = service(chain.clone(), test_config());

    assert_eq!(service.poller().state(), PollerState::Stopped);
    assert!(service.poller().start());
    assert!(!service.poller().start());

    timeout(Duration::from_secs(2), async {
        while service.poller().state() != PollerState::Running {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    service.poller().stop().await;
    assert_eq!(service.poller().state(), PollerState::Stopped);

    let calls = chain.height_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(chain.height_calls.load(Ordering::SeqCst), calls);

    // A stopped poller can be started again
    assert!(service.poller().start());
    service.poller().stop().await;
}

#[tokio::test]
async fn test_startup_retries_until_node_answers() {
    let chain = Arc::new(MockChain::at_height(1000));
    chain.fail_height(true);
    let mut config = test_config();
    config.monitor.startup_backoff_ms = 10;
    config.monitor.startup_backoff_max_ms = 20;
    let service = service(chain.clone(), config);

    service.poller().start();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(service.poller().state(), PollerState::Starting);
    assert_eq!(service.poller().cursor(), None);

    chain.fail_height(false);
    timeout(Duration::from_secs(2), async {
        while service.poller().cursor().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(service.poller().cursor(), Some(1000));
    service.stop().await;
}

#[tokio::test]
async fn test_background_tasks_resolve_transfer() {
    let chain = Arc::new(MockChain::at_height(1000));
    let service = service(chain.clone(), test_config());
    let mut events = service.publisher().subscribe();

    service.start();
    timeout(Duration::from_secs(2), async {
        while service.poller().cursor().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    chain.add_block(1001, vec![native_transfer("tx1", UNWATCHED, WATCHED, 7_500_000)]);
    chain.set_height(1001);

    let first = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(first.status, TransactionStatus::Pending);
    assert_eq!(first.amount, 7.5);

    chain.set_status("tx1", success(1001));
    let second = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(second.transaction_id, "tx1");
    assert_eq!(second.status, TransactionStatus::Success);

    service.stop().await;
    assert!(service.pending().is_empty());
}

#[tokio::test]
async fn test_invalid_initial_address_fails_startup() {
    let chain: Arc<dyn ChainRpc> = Arc::new(MockChain::at_height(1));
    let mut config = test_config();
    config.monitor.watch_addresses.push("not-an-address".into());
    assert!(WatchService::with_rpc(config, chain, vault()).is_err());
}
