//! Hot reload of the watch address list.
//!
//! Only `monitor.watch_addresses` is live; every other setting needs a
//! restart. Each edit that parses, validates and changes the address list
//! produces one update carrying the full parsed list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::blockchain::address::TronAddress;
use crate::config::loader::load_config;

/// Watches the config file and emits the address list after each change.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Vec<TronAddress>>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver of reloaded address lists.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Vec<TronAddress>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. File events arrive on notify's thread; the returned
    /// watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let mut last_sent: Option<Vec<TronAddress>> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let Some(addresses) = reload_addresses(&path, &mut last_sent) else {
                        return;
                    };
                    tracing::info!(addresses = addresses.len(), "Watch addresses reloaded");
                    if tx.send(addresses).is_err() {
                        tracing::warn!(path = %path.display(), "Config reload dropped; nothing is listening for updates");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Reload `path` and return its watch addresses if they differ from
/// `last_sent`. A file that fails to load or validate is logged and ignored.
fn reload_addresses(
    path: &Path,
    last_sent: &mut Option<Vec<TronAddress>>,
) -> Option<Vec<TronAddress>> {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to reload config; keeping current watchlist");
            return None;
        }
    };

    let mut addresses = Vec::with_capacity(config.monitor.watch_addresses.len());
    for entry in &config.monitor.watch_addresses {
        match entry.trim().parse::<TronAddress>() {
            Ok(address) => addresses.push(address),
            Err(e) => tracing::warn!(address = %entry, error = %e, "Ignoring invalid watch address"),
        }
    }
    addresses.sort();
    addresses.dedup();

    if last_sent.as_ref() == Some(&addresses) {
        return None;
    }
    *last_sent = Some(addresses.clone());
    Some(addresses)
}
