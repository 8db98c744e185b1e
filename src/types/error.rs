//! Error types for the wallet ledger
//!
//! This module defines every error the ledger core can report. The HTTP
//! gateway maps them to status codes through [`LedgerError::kind`] without
//! leaking storage details.
//!
//! # Error Categories
//!
//! - **NotFound**: a referenced wallet does not exist
//! - **InvalidArgument**: `from == to`, a non-positive amount, or a malformed payload
//! - **InsufficientFunds**: the debit would drive a balance negative
//! - **Conflict**: transient lock contention; the whole transfer is safe to retry
//! - **Internal**: unexpected storage or arithmetic failure

use super::wallet::WalletId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse error classification used at the transport boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    InsufficientFunds,
    Conflict,
    Internal,
}

/// Main error type for the ledger
///
/// Every failed operation has no observable effect on ledger state, so any
/// of these errors leaves balances and history exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Referenced wallet does not exist
    #[error("Wallet {id} not found")]
    WalletNotFound {
        /// The unknown wallet id
        id: WalletId,
    },

    /// Request arguments are invalid
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem
        message: String,
    },

    /// Debit would leave the wallet with a negative balance
    #[error("Insufficient funds in wallet {wallet}: requested {requested}")]
    InsufficientFunds {
        /// The debited wallet
        wallet: WalletId,
        /// Requested transfer amount
        requested: Decimal,
    },

    /// Transient contention on wallet rows
    ///
    /// Raised when a row lock cannot be acquired within the configured wait.
    /// Nothing was written, so the caller may retry the whole transfer.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the contention
        message: String,
    },

    /// Unexpected storage or logic failure
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl LedgerError {
    /// Create a WalletNotFound error
    pub fn wallet_not_found(id: &WalletId) -> Self {
        LedgerError::WalletNotFound { id: id.clone() }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(wallet: &WalletId, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            wallet: wallet.clone(),
            requested,
        }
    }

    /// Create a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::Internal {
            message: message.into(),
        }
    }

    /// Classify this error for the transport boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::WalletNotFound { .. } => ErrorKind::NotFound,
            LedgerError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::wallet_not_found(
        LedgerError::wallet_not_found(&WalletId::from("w-1")),
        "Wallet w-1 not found"
    )]
    #[case::invalid_argument(
        LedgerError::invalid_argument("amount must be positive"),
        "Invalid argument: amount must be positive"
    )]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(&WalletId::from("w-1"), dec!(1000.0)),
        "Insufficient funds in wallet w-1: requested 1000.0"
    )]
    #[case::conflict(
        LedgerError::conflict("lock wait timed out"),
        "Conflict: lock wait timed out"
    )]
    #[case::internal(
        LedgerError::internal("balance overflow"),
        "Internal error: balance overflow"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(LedgerError::wallet_not_found(&WalletId::from("x")), ErrorKind::NotFound)]
    #[case::invalid(LedgerError::invalid_argument("x"), ErrorKind::InvalidArgument)]
    #[case::funds(
        LedgerError::insufficient_funds(&WalletId::from("x"), dec!(1)),
        ErrorKind::InsufficientFunds
    )]
    #[case::conflict(LedgerError::conflict("x"), ErrorKind::Conflict)]
    #[case::internal(LedgerError::internal("x"), ErrorKind::Internal)]
    fn test_kind(#[case] error: LedgerError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(LedgerError::conflict("busy").is_retryable());
        assert!(!LedgerError::internal("boom").is_retryable());
        assert!(!LedgerError::insufficient_funds(&WalletId::from("x"), dec!(1)).is_retryable());
    }
}
