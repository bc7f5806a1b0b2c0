//! Startup orchestration.
//!
//! Order: secrets → node client → store → shared state → scanners → admin
//! API. Any failure before the scanners start is fatal; after that, node
//! errors are transient and handled by the scanners themselves.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};
use crate::blockchain::address::{AddressError, TronAddress};
use crate::blockchain::client::{ChainRpc, TronHttpClient};
use crate::blockchain::types::RpcError;
use crate::config::watcher::ConfigWatcher;
use crate::config::WatchConfig;
use crate::lifecycle::Shutdown;
use crate::monitor::publisher::log_events;
use crate::monitor::{
    ChainPoller, EventPublisher, PendingReconciler, PendingSet, PollerSettings, TransferFilter,
    Watchlist,
};
use crate::security::{KeyVault, VaultError};
use crate::store::{RecordStore, StoreError, TransactionStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Key vault: {0}")]
    Vault(#[from] VaultError),
    #[error("Node client: {0}")]
    Rpc(#[from] RpcError),
    #[error("Transaction store: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid address in configuration: {0}")]
    Address(#[from] AddressError),
    #[error("Environment variable {0} must be set")]
    MissingSecret(String),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
}

/// Every long-lived component of the monitor, wired together.
pub struct WatchService {
    config: WatchConfig,
    vault: KeyVault,
    watchlist: Arc<Watchlist>,
    pending: Arc<PendingSet>,
    store: Arc<dyn TransactionStore>,
    publisher: EventPublisher,
    poller: Arc<ChainPoller>,
    reconciler: PendingReconciler,
}

impl WatchService {
    /// Build against the configured TRON node.
    pub fn build(config: WatchConfig) -> Result<Self, StartupError> {
        let vault = KeyVault::from_env(&config.vault.key_env)?;
        let api_key = config
            .rpc
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());
        let rpc: Arc<dyn ChainRpc> = Arc::new(TronHttpClient::new(config.rpc.clone(), api_key)?);
        Self::with_rpc(config, rpc, vault)
    }

    /// Build against any node implementation.
    pub fn with_rpc(
        config: WatchConfig,
        rpc: Arc<dyn ChainRpc>,
        vault: KeyVault,
    ) -> Result<Self, StartupError> {
        let store: Arc<dyn TransactionStore> = match &config.store.path {
            Some(path) => Arc::new(RecordStore::open(path)?),
            None => Arc::new(RecordStore::new()),
        };

        let watchlist = Arc::new(Watchlist::new());
        for address in &config.monitor.watch_addresses {
            watchlist.add_address(address.trim().parse::<TronAddress>()?);
        }

        let pending = Arc::new(PendingSet::new());
        let publisher = EventPublisher::new(config.events.capacity);
        let filter = TransferFilter::from_config(&config.token)?;

        let poller = Arc::new(ChainPoller::new(
            rpc.clone(),
            watchlist.clone(),
            pending.clone(),
            store.clone(),
            publisher.clone(),
            filter,
            PollerSettings::from(&config.monitor),
        ));
        let reconciler = PendingReconciler::new(
            rpc,
            pending.clone(),
            store.clone(),
            publisher.clone(),
            Duration::from_millis(config.reconciler.interval_ms),
        );

        tracing::info!(
            watched = watchlist.len(),
            stored = store.len(),
            token = %config.token.symbol,
            "Monitor initialized"
        );

        Ok(Self {
            config,
            vault,
            watchlist,
            pending,
            store,
            publisher,
            poller,
            reconciler,
        })
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn vault(&self) -> &KeyVault {
        &self.vault
    }

    pub fn watchlist(&self) -> &Arc<Watchlist> {
        &self.watchlist
    }

    pub fn pending(&self) -> &Arc<PendingSet> {
        &self.pending
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn poller(&self) -> &ChainPoller {
        &self.poller
    }

    pub fn reconciler(&self) -> &PendingReconciler {
        &self.reconciler
    }

    /// Start both scanners. Calling again while they run is a no-op.
    pub fn start(&self) {
        self.poller.start();
        self.reconciler.start();
    }

    /// Stop both scanners and persist the store.
    pub async fn stop(&self) {
        self.poller.stop().await;
        self.reconciler.stop().await;
        if let Err(e) = self.store.flush() {
            tracing::error!(error = %e, "Failed to persist transaction records on shutdown");
        }
    }

    /// Run until `shutdown` fires.
    ///
    /// When `config_path` is given, edits to that file merge newly listed
    /// watch addresses into the live watchlist.
    pub async fn run(
        &self,
        shutdown: Shutdown,
        config_path: Option<PathBuf>,
    ) -> Result<(), StartupError> {
        let mut stop = shutdown.subscribe();

        let admin = if self.config.admin.enabled {
            Some(self.spawn_admin(&shutdown).await?)
        } else {
            None
        };

        tokio::spawn(log_events(self.publisher.clone(), shutdown.clone()));

        // Dropping the notify watcher ends file watching
        let _config_watcher = match config_path {
            Some(path) => self.spawn_config_reload(path, &shutdown),
            None => None,
        };

        self.start();
        tracing::info!("Monitor running");

        let _ = stop.recv().await;
        tracing::info!("Shutting down");

        self.stop().await;
        if let Some(handle) = admin {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Admin server task failed");
            }
        }
        Ok(())
    }

    async fn spawn_admin(
        &self,
        shutdown: &Shutdown,
    ) -> Result<tokio::task::JoinHandle<()>, StartupError> {
        let admin = &self.config.admin;
        let api_key = std::env::var(&admin.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StartupError::MissingSecret(admin.api_key_env.clone()))?;

        let state = AdminState {
            watchlist: self.watchlist.clone(),
            pending: self.pending.clone(),
            store: self.store.clone(),
            poller: self.poller.clone(),
            api_key: Arc::from(api_key),
        };
        let app = setup_admin_router(state, Duration::from_secs(admin.request_timeout_secs));

        let listener = TcpListener::bind(&admin.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                address: admin.bind_address.clone(),
                source,
            })?;
        tracing::info!(address = %admin.bind_address, "Admin API listening");

        let mut stop = shutdown.subscribe();
        Ok(tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API server error");
            }
            tracing::info!("Admin API stopped");
        }))
    }

    fn spawn_config_reload(
        &self,
        path: PathBuf,
        shutdown: &Shutdown,
    ) -> Option<notify::RecommendedWatcher> {
        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let watcher = match watcher.run() {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config hot reload unavailable");
                return None;
            }
        };

        let watchlist = self.watchlist.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = updates.recv() => match update {
                        Some(addresses) => merge_watch_addresses(&watchlist, &addresses),
                        None => break,
                    },
                    _ = stop.recv() => break,
                }
            }
        });

        Some(watcher)
    }
}

/// Add every reloaded address to `watchlist`. Removals are left to the
/// admin API.
fn merge_watch_addresses(watchlist: &Watchlist, addresses: &[TronAddress]) {
    let added = addresses
        .iter()
        .filter(|address| watchlist.add_address(**address))
        .count();
    if added > 0 {
        tracing::info!(added, total = watchlist.len(), "Watchlist updated from config");
    }
}
