//! Operator HTTP API.
//!
//! # Routes
//! ```text
//! GET    /admin/status                 poller state, cursor, set sizes
//! GET    /admin/addresses              watched addresses
//! POST   /admin/addresses              {"address": "..."} start watching
//! DELETE /admin/addresses/{address}    stop watching
//! GET    /admin/pending                transactions awaiting a terminal status
//! GET    /admin/transactions/{tx_id}   stored record for one transaction
//! ```
//!
//! Every route requires `Authorization: Bearer <key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::monitor::{ChainPoller, PendingSet, Watchlist};
use crate::store::TransactionStore;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared handles the admin handlers read and mutate.
#[derive(Clone)]
pub struct AdminState {
    pub watchlist: Arc<Watchlist>,
    pub pending: Arc<PendingSet>,
    pub store: Arc<dyn TransactionStore>,
    pub poller: Arc<ChainPoller>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/addresses", get(list_addresses).post(add_address))
        .route("/admin/addresses/{address}", delete(remove_address))
        .route("/admin/pending", get(list_pending))
        .route("/admin/transactions/{tx_id}", get(get_transaction))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
