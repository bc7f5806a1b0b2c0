use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::blockchain::address::TronAddress;
use crate::monitor::{PollerState, ProcessedTransaction};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub poller: PollerState,
    pub scan_cursor: Option<u64>,
    pub watched_addresses: usize,
    pub pending_transactions: usize,
    pub stored_transactions: usize,
}

#[derive(Deserialize)]
pub struct AddAddressRequest {
    pub address: String,
}

/// Reply to a watchlist mutation, with the list as it now stands.
#[derive(Serialize)]
pub struct AddressChange {
    pub success: bool,
    pub message: String,
    pub addresses: Vec<String>,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn address_change(state: &AdminState, status: StatusCode, success: bool, message: String) -> Response {
    let body = AddressChange {
        success,
        message,
        addresses: state.watchlist.list(),
    };
    (status, Json(body)).into_response()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        poller: state.poller.state(),
        scan_cursor: state.poller.cursor(),
        watched_addresses: state.watchlist.len(),
        pending_transactions: state.pending.len(),
        stored_transactions: state.store.len(),
    })
}

pub async fn list_addresses(State(state): State<AdminState>) -> Json<Vec<String>> {
    Json(state.watchlist.list())
}

pub async fn add_address(
    State(state): State<AdminState>,
    Json(body): Json<AddAddressRequest>,
) -> Response {
    let address: TronAddress = match body.address.trim().parse() {
        Ok(address) => address,
        Err(e) => {
            return address_change(
                &state,
                StatusCode::BAD_REQUEST,
                false,
                format!("Invalid address {}: {}", body.address.trim(), e),
            )
        }
    };

    if state.watchlist.add_address(address) {
        address_change(&state, StatusCode::CREATED, true, format!("Now watching {}", address))
    } else {
        address_change(&state, StatusCode::OK, true, format!("{} is already watched", address))
    }
}

pub async fn remove_address(
    State(state): State<AdminState>,
    Path(address): Path<String>,
) -> Response {
    if state.watchlist.remove(&address) {
        address_change(&state, StatusCode::OK, true, format!("Stopped watching {}", address))
    } else {
        address_change(&state, StatusCode::NOT_FOUND, false, format!("{} is not watched", address))
    }
}

pub async fn list_pending(State(state): State<AdminState>) -> Json<Vec<ProcessedTransaction>> {
    Json(state.pending.snapshot())
}

pub async fn get_transaction(
    State(state): State<AdminState>,
    Path(tx_id): Path<String>,
) -> Response {
    match state.store.get(&tx_id) {
        Some(record) => Json(record).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("Unknown transaction {}", tx_id)),
    }
}
