//! Core traits for wallet storage, transfer history, and atomic scopes
//!
//! The ledger engine and query service depend only on these abstractions, so
//! the persistence backend can be swapped without touching the transfer
//! logic. [`crate::core::MemoryLedgerStore`] is the production implementation.

use crate::types::{LedgerError, Transaction, Wallet, WalletId};
use rust_decimal::Decimal;

/// Durable mapping from wallet id to current balance
pub trait WalletStore: Send + Sync {
    /// Allocate a fresh wallet id and persist it with `initial_balance`
    fn create_wallet(&self, initial_balance: Decimal) -> Result<Wallet, LedgerError>;

    /// Current committed balance of a wallet
    ///
    /// Fails with `WalletNotFound` if the id is unknown.
    fn balance(&self, id: &WalletId) -> Result<Decimal, LedgerError>;

    /// Whether a wallet with this id exists
    fn exists(&self, id: &WalletId) -> Result<bool, LedgerError>;
}

/// Append-only record of committed transfers
pub trait HistoryLog: Send + Sync {
    /// Every committed transfer in which `id` is sender or recipient,
    /// ascending by time
    ///
    /// Returns an empty list for a wallet without history (or an unknown id;
    /// existence is checked by the caller).
    fn list_by_wallet(&self, id: &WalletId) -> Result<Vec<Transaction>, LedgerError>;
}

/// A unit of work spanning balances and history
///
/// Writes issued through a scope are invisible to every other caller until
/// [`AtomicScope::commit`] succeeds. Dropping a scope without committing
/// rolls back everything it staged.
pub trait AtomicScope {
    /// Apply `delta` to a wallet's balance only if the result stays at or
    /// above `min_result`
    ///
    /// `None` means no lower bound. Returns `Ok(false)` and stages nothing
    /// when the bound would be violated. The check and the mutation are one
    /// step, evaluated against the balance as seen inside this scope.
    ///
    /// Fails with `WalletNotFound` if the wallet does not exist.
    fn conditional_adjust(
        &mut self,
        id: &WalletId,
        delta: Decimal,
        min_result: Option<Decimal>,
    ) -> Result<bool, LedgerError>;

    /// Stage a history record for the transfer this scope applies
    fn append(&mut self, transaction: Transaction) -> Result<(), LedgerError>;

    /// Publish every staged write at once
    fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}

/// A store able to open atomic scopes over both balances and history
pub trait LedgerStore: WalletStore + HistoryLog {
    /// Open an atomic scope covering `wallets`
    ///
    /// Implementations must acquire the wallets in one fixed global order
    /// regardless of the order given, so two scopes over the same pair never
    /// deadlock. Unknown ids are allowed; adjusting them inside the scope
    /// fails with `WalletNotFound`.
    fn begin<'a>(&'a self, wallets: &[WalletId])
        -> Result<Box<dyn AtomicScope + 'a>, LedgerError>;
}
