//! Request handlers
//!
//! Each handler decodes its input, runs the matching core call on the
//! blocking pool and maps the result onto a response.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use super::dto::TransferRequest;
use super::errors::{json_error, ledger_error_to_response};
use super::AppState;
use crate::types::{LedgerError, WalletId};

/// Run a core call on the blocking pool
///
/// The store waits on row locks, which must not stall the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, LedgerError>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| LedgerError::internal(format!("ledger task failed: {}", err)))?
}

pub async fn create_wallet(State(state): State<AppState>) -> Response {
    let engine = state.engine.clone();
    match run_blocking(move || engine.create_wallet()).await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(err) => ledger_error_to_response(err),
    }
}

pub async fn transfer(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection, "rejected transfer body");
            return json_error(StatusCode::BAD_REQUEST, "invalid_json", "invalid json body");
        }
    };

    let engine = state.engine.clone();
    let from = WalletId::from(wallet_id);
    let to = WalletId::from(request.to);
    match run_blocking(move || engine.transfer(&from, &to, request.amount)).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => ledger_error_to_response(err),
    }
}

pub async fn get_wallet_status(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Response {
    let query = state.query.clone();
    let id = WalletId::from(wallet_id);
    match run_blocking(move || query.get_wallet_status(&id)).await {
        Ok(wallet) => (StatusCode::OK, Json(wallet)).into_response(),
        Err(err) => ledger_error_to_response(err),
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Response {
    let query = state.query.clone();
    let id = WalletId::from(wallet_id);
    match run_blocking(move || query.get_history(&id)).await {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(err) => ledger_error_to_response(err),
    }
}
