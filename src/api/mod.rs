//! # HTTP gateway
//!
//! Translates HTTP requests into [`LedgerEngine`] and [`QueryService`] calls
//! and maps their results onto responses.
//!
//! ## Endpoints
//!
//! | Method | Path                               | Description              |
//! |--------|------------------------------------|--------------------------|
//! | POST   | `/api/v1/wallet`                   | Create a wallet          |
//! | POST   | `/api/v1/wallet/:wallet_id/send`   | Transfer to another wallet |
//! | GET    | `/api/v1/wallet/:wallet_id`        | Wallet balance           |
//! | GET    | `/api/v1/wallet/:wallet_id/history`| Transfer history         |

mod dto;
mod errors;
mod routes;

pub use dto::TransferRequest;
pub use errors::{json_error, ledger_error_to_response};

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::LedgerConfig;
use crate::core::{LedgerEngine, LedgerStore, MemoryLedgerStore, QueryService, SledLedgerStore};
use crate::types::LedgerError;

/// Shared state available to all request handlers
///
/// Cheap to clone; both services share one store.
#[derive(Clone)]
pub struct AppState {
    pub engine: LedgerEngine,
    pub query: QueryService,
}

impl AppState {
    /// Build the services on top of an existing store
    pub fn with_store(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> Self {
        Self {
            engine: LedgerEngine::new(Arc::clone(&store), config),
            query: QueryService::new(store),
        }
    }

    /// Build the services on the store selected by `config`
    ///
    /// With a data directory the sled store is opened (and its state
    /// restored); without one everything lives in memory.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store: Arc<dyn LedgerStore> = match &config.data_dir {
            Some(dir) => Arc::new(SledLedgerStore::open(dir, config.lock_timeout)?),
            None => Arc::new(MemoryLedgerStore::new(config.lock_timeout)),
        };
        Ok(Self::with_store(store, config))
    }
}

/// Build the axum [`Router`] with all wallet routes and request tracing
pub fn create_router(state: AppState) -> Router {
    let wallet_routes = Router::new()
        .route("/wallet", post(routes::create_wallet))
        .route("/wallet/:wallet_id", get(routes::get_wallet_status))
        .route("/wallet/:wallet_id/send", post(routes::transfer))
        .route("/wallet/:wallet_id/history", get(routes::get_history));

    Router::new()
        .nest("/api/v1", wallet_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
