//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Store abstractions the engine and query service depend on
//! - `wallet_store` - Wallet balance table with per-row locking
//! - `history_log` - Append-only transfer history
//! - `store` - Locking store combining both, with atomic scopes and a journal
//! - `sled_store` - Durable journal on sled, the production backend
//! - `engine` - Wallet creation and transfers
//! - `query` - Read-only balance and history lookups

pub mod engine;
pub mod history_log;
pub mod query;
pub mod sled_store;
pub mod store;
pub mod traits;
pub mod wallet_store;

pub use engine::{LedgerEngine, TransferState};
pub use history_log::MemoryHistoryLog;
pub use query::QueryService;
pub use sled_store::{SledJournal, SledLedgerStore};
pub use store::{Journal, LockingLedgerStore, MemoryLedgerStore, NoJournal};
pub use traits::{AtomicScope, HistoryLog, LedgerStore, WalletStore};
pub use wallet_store::MemoryWalletStore;
