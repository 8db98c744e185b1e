//! Wallet Ledger Library
//! # Overview
//!
//! This library tracks per-wallet balances and moves money between wallets,
//! keeping every balance consistent with its transfer history under
//! concurrent requests.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Wallet, Transaction, LedgerError)
//! - [`core`] - Business logic components:
//!   - [`core::wallet_store`] - Wallet balances with per-row locking
//!   - [`core::history_log`] - Append-only transfer history
//!   - [`core::store`] - Locking store and its atomic scopes
//!   - [`core::sled_store`] - Durable sled backend
//!   - [`core::engine`] - Wallet creation and transfers
//!   - [`core::query`] - Balance and history lookups
//! - [`config`] - Configuration values built once at startup
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - Tracing subscriber setup
//! - [`api`] - HTTP gateway
//!
//! # Ledger Invariants
//!
//! - No balance is ever negative.
//! - A transfer's debit, credit and history record commit together or not at all.
//! - Transfers never change the sum of all balances.
//! - Every history record has `from != to` and a positive amount.

// Module declarations
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod types;

pub use config::{LedgerConfig, ServerConfig};
pub use core::{LedgerEngine, LedgerStore, MemoryLedgerStore, QueryService, SledLedgerStore};
pub use types::{ErrorKind, LedgerError, Transaction, Wallet, WalletId};
