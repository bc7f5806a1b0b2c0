//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tron_watch_rpc_errors_total` (counter): failed node calls by operation
//! - `tron_watch_rpc_healthy` (gauge): 1=primary reachable, 0=unreachable
//! - `tron_watch_blocks_scanned_total` (counter): blocks fetched and matched
//! - `tron_watch_scan_cursor` (gauge): last fully processed block height
//! - `tron_watch_matches_total` (counter): transfers touching a watched address, by asset
//! - `tron_watch_status_events_total` (counter): published events by status
//! - `tron_watch_watchlist_size` (gauge): watched addresses
//! - `tron_watch_pending_size` (gauge): transactions awaiting a terminal status
//!
//! Updates are no-ops until a recorder is installed by [`init_metrics`].

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_error(operation: &'static str) {
    counter!("tron_watch_rpc_errors_total", "operation" => operation).increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    gauge!("tron_watch_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_blocks_scanned(count: u64) {
    counter!("tron_watch_blocks_scanned_total").increment(count);
}

pub fn set_scan_cursor(height: u64) {
    gauge!("tron_watch_scan_cursor").set(height as f64);
}

pub fn record_match(asset: &'static str) {
    counter!("tron_watch_matches_total", "asset" => asset).increment(1);
}

pub fn record_status_event(status: &'static str) {
    counter!("tron_watch_status_events_total", "status" => status).increment(1);
}

pub fn set_watchlist_size(size: usize) {
    gauge!("tron_watch_watchlist_size").set(size as f64);
}

pub fn set_pending_size(size: usize) {
    gauge!("tron_watch_pending_size").set(size as f64);
}
