//! Ledger engine
//!
//! This module provides the `LedgerEngine` that handles every write to the
//! ledger: wallet creation and transfers.
//!
//! The engine owns no state. It enforces the transfer rules and drives each
//! transfer through one atomic scope of the underlying [`LedgerStore`]:
//! - `from != to` and `amount > 0`
//! - the debit is a single check-and-mutate step, so two concurrent debits
//!   can never both pass a stale balance check
//! - debit, credit and history record commit together or not at all

use crate::config::LedgerConfig;
use crate::core::traits::LedgerStore;
use crate::types::{ErrorKind, LedgerError, Transaction, Wallet, WalletId};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Progress of a single transfer
///
/// `Validated → Locked → Applied → Committed` on success. Any failure ends
/// in `Aborted`, which leaves no trace besides the returned error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Received,
    Validated,
    Locked,
    Applied,
    Committed,
    Aborted,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Received => "received",
            TransferState::Validated => "validated",
            TransferState::Locked => "locked",
            TransferState::Applied => "applied",
            TransferState::Committed => "committed",
            TransferState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Write side of the ledger
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    default_balance: Decimal,
}

impl LedgerEngine {
    /// Create a new LedgerEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Backend holding balances and history
    /// * `config` - Ledger settings; only the default balance is used here
    pub fn new(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> Self {
        LedgerEngine {
            store,
            default_balance: config.default_balance,
        }
    }

    /// Create a wallet holding the configured default balance
    pub fn create_wallet(&self) -> Result<Wallet, LedgerError> {
        self.store.create_wallet(self.default_balance)
    }

    /// Move `amount` from one wallet to another
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `from == to` or `amount <= 0`
    /// - `WalletNotFound` if either wallet does not exist
    /// - `InsufficientFunds` if the debit would make `from` negative
    /// - `Conflict` if a wallet stayed locked past the configured wait
    /// - `Internal` on arithmetic overflow or store failure
    ///
    /// On any error no balance and no history record has changed.
    pub fn transfer(
        &self,
        from: &WalletId,
        to: &WalletId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let mut state = TransferState::Received;
        let result = self.run_transfer(from, to, amount, &mut state);

        match &result {
            Ok(()) => info!(%from, %to, %amount, "transfer committed"),
            Err(err) => {
                let reached = state;
                state = TransferState::Aborted;
                match err.kind() {
                    ErrorKind::Internal => {
                        error!(%from, %to, %amount, %reached, %state, error = %err, "transfer failed")
                    }
                    _ => warn!(%from, %to, %amount, %reached, %state, error = %err, "transfer rejected"),
                }
            }
        }
        result
    }

    fn run_transfer(
        &self,
        from: &WalletId,
        to: &WalletId,
        amount: Decimal,
        state: &mut TransferState,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::invalid_argument(
                "source and destination wallets must differ",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_argument("amount must be positive"));
        }
        *state = TransferState::Validated;

        // Wallets are never deleted, so this answer cannot go stale. It lets
        // an unknown sender be told apart from an underfunded one.
        if !self.store.exists(from)? {
            return Err(LedgerError::wallet_not_found(from));
        }

        let mut scope = self.store.begin(&[from.clone(), to.clone()])?;
        *state = TransferState::Locked;
        debug!(%from, %to, "transfer rows locked");

        if !scope.conditional_adjust(from, -amount, Some(Decimal::ZERO))? {
            return Err(LedgerError::insufficient_funds(from, amount));
        }
        if !scope.conditional_adjust(to, amount, None)? {
            return Err(LedgerError::internal("unbounded credit was refused"));
        }
        scope.append(Transaction::new(from.clone(), to.clone(), amount))?;
        *state = TransferState::Applied;

        scope.commit()?;
        *state = TransferState::Committed;
        Ok(())
    }
}
