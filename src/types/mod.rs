//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet ids and wallet records
//! - `transaction`: History records of committed transfers
//! - `error`: Error types for the ledger

pub mod error;
pub mod transaction;
pub mod wallet;

pub use error::{ErrorKind, LedgerError};
pub use transaction::Transaction;
pub use wallet::{Wallet, WalletId};
