//! Ledger stores with per-wallet locking
//!
//! `LockingLedgerStore` combines the balance table and the history log and is
//! the only place that can open an atomic scope over both. Every commit is
//! handed to a [`Journal`] before it becomes visible:
//! - [`MemoryLedgerStore`] uses [`NoJournal`] and keeps state in process only
//! - [`crate::core::SledLedgerStore`] writes each commit to disk
//!
//! # Atomic scopes
//!
//! ```text
//! begin(ids) ── lock rows in ascending id order ──▶ MemoryScope
//!     conditional_adjust / append   (staged, invisible to others)
//!     commit ── journal, then publish balances + history, then release rows
//!     drop   ── discard staged writes, then release rows
//! ```
//!
//! All row locks are held from `begin` until the scope is dropped, and every
//! reader of a balance or a history list takes the same row lock first. A
//! reader therefore sees either none or all of a transfer's three writes.
//! A journal failure leaves the scope uncommitted, so nothing is published.

use crate::core::history_log::MemoryHistoryLog;
use crate::core::traits::{AtomicScope, HistoryLog, LedgerStore, WalletStore};
use crate::core::wallet_store::{MemoryWalletStore, RowGuard};
use crate::types::{LedgerError, Transaction, Wallet, WalletId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::mem;
use std::time::Duration;
use tracing::{debug, info};

/// Durable record of wallet creations and committed scopes
pub trait Journal: Send + Sync {
    /// Persist a new wallet before it becomes visible
    fn record_wallet(&self, wallet: &Wallet) -> Result<(), LedgerError>;

    /// Persist every balance and history record of one scope as a single
    /// atomic write
    fn record_commit(
        &self,
        balances: &HashMap<WalletId, Decimal>,
        records: &[Transaction],
    ) -> Result<(), LedgerError>;
}

/// Journal that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJournal;

impl Journal for NoJournal {
    fn record_wallet(&self, _wallet: &Wallet) -> Result<(), LedgerError> {
        Ok(())
    }

    fn record_commit(
        &self,
        _balances: &HashMap<WalletId, Decimal>,
        _records: &[Transaction],
    ) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Ledger store with per-wallet locking over a journal
#[derive(Debug)]
pub struct LockingLedgerStore<J> {
    wallets: MemoryWalletStore,
    history: MemoryHistoryLog,
    journal: J,
}

/// In-process store without persistence, used in tests and benchmarks
pub type MemoryLedgerStore = LockingLedgerStore<NoJournal>;

impl LockingLedgerStore<NoJournal> {
    /// Create an empty in-memory store
    ///
    /// # Arguments
    ///
    /// * `lock_timeout` - Maximum wait for any single wallet row lock
    pub fn new(lock_timeout: Duration) -> Self {
        Self::with_journal(NoJournal, lock_timeout)
    }
}

impl<J: Journal> LockingLedgerStore<J> {
    /// Create an empty store that records commits in `journal`
    pub(crate) fn with_journal(journal: J, lock_timeout: Duration) -> Self {
        Self {
            wallets: MemoryWalletStore::new(lock_timeout),
            history: MemoryHistoryLog::new(),
            journal,
        }
    }

    /// Load previously persisted state
    ///
    /// `history` must be in commit order. Nothing is written to the journal.
    pub(crate) fn restore(
        &self,
        wallets: Vec<Wallet>,
        history: Vec<Transaction>,
    ) -> Result<(), LedgerError> {
        let (wallet_count, record_count) = (wallets.len(), history.len());

        for wallet in &wallets {
            self.wallets.insert(wallet)?;
        }
        for transaction in history {
            for id in [&transaction.from, &transaction.to] {
                if !self.wallets.exists(id)? {
                    return Err(LedgerError::internal(format!(
                        "persisted history references unknown wallet {}",
                        id
                    )));
                }
            }
            self.history.push(transaction);
        }

        info!(
            wallets = wallet_count,
            records = record_count,
            "ledger state restored"
        );
        Ok(())
    }

    /// Number of wallets
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }
}

impl<J: Journal> WalletStore for LockingLedgerStore<J> {
    fn create_wallet(&self, initial_balance: Decimal) -> Result<Wallet, LedgerError> {
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_argument(
                "initial balance must not be negative",
            ));
        }

        let wallet = Wallet::new(WalletId::generate(), initial_balance);
        self.journal.record_wallet(&wallet)?;
        self.wallets.insert(&wallet)?;

        info!(wallet = %wallet.id, balance = %initial_balance, "wallet created");
        Ok(wallet)
    }

    fn balance(&self, id: &WalletId) -> Result<Decimal, LedgerError> {
        self.wallets.balance(id)
    }

    fn exists(&self, id: &WalletId) -> Result<bool, LedgerError> {
        self.wallets.exists(id)
    }
}

impl<J: Journal> HistoryLog for LockingLedgerStore<J> {
    fn list_by_wallet(&self, id: &WalletId) -> Result<Vec<Transaction>, LedgerError> {
        // Wait out any scope that is committing to this wallet.
        let _row = self.wallets.wait_row(id);
        self.history.list_by_wallet(id)
    }
}

impl<J: Journal> LedgerStore for LockingLedgerStore<J> {
    fn begin<'a>(
        &'a self,
        wallets: &[WalletId],
    ) -> Result<Box<dyn AtomicScope + 'a>, LedgerError> {
        let rows = self.wallets.lock_rows(wallets)?;
        debug!(requested = wallets.len(), locked = rows.len(), "atomic scope opened");

        Ok(Box::new(MemoryScope {
            wallets: &self.wallets,
            history: &self.history,
            journal: &self.journal,
            rows,
            staged: HashMap::new(),
            pending: Vec::new(),
            committed: false,
        }))
    }
}

/// Atomic scope over a set of locked wallet rows
struct MemoryScope<'a, J> {
    wallets: &'a MemoryWalletStore,
    history: &'a MemoryHistoryLog,
    journal: &'a J,

    /// Locked rows in acquisition order
    rows: Vec<(WalletId, RowGuard)>,

    /// Balances as they will be after commit
    staged: HashMap<WalletId, Decimal>,

    /// History records to append on commit
    pending: Vec<Transaction>,

    committed: bool,
}

impl<J> MemoryScope<'_, J> {
    fn row(&self, id: &WalletId) -> Option<&RowGuard> {
        self.rows
            .iter()
            .find(|(locked, _)| locked == id)
            .map(|(_, guard)| guard)
    }

    /// Error for an id this scope holds no lock on
    fn not_enrolled(&self, id: &WalletId) -> LedgerError {
        match self.wallets.exists(id) {
            Ok(true) => LedgerError::internal(format!(
                "wallet {} is not part of this atomic scope",
                id
            )),
            Ok(false) => LedgerError::wallet_not_found(id),
            Err(err) => err,
        }
    }
}

impl<J: Journal> AtomicScope for MemoryScope<'_, J> {
    fn conditional_adjust(
        &mut self,
        id: &WalletId,
        delta: Decimal,
        min_result: Option<Decimal>,
    ) -> Result<bool, LedgerError> {
        let committed_balance = match self.row(id) {
            Some(guard) => **guard,
            None => return Err(self.not_enrolled(id)),
        };
        let current = self.staged.get(id).copied().unwrap_or(committed_balance);

        let next = current.checked_add(delta).ok_or_else(|| {
            LedgerError::internal(format!("balance overflow on wallet {}", id))
        })?;

        if let Some(min) = min_result {
            if next < min {
                return Ok(false);
            }
        }

        self.staged.insert(id.clone(), next);
        Ok(true)
    }

    fn append(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        for id in [&transaction.from, &transaction.to] {
            if self.row(id).is_none() {
                return Err(self.not_enrolled(id));
            }
        }

        self.pending.push(transaction);
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), LedgerError> {
        let records = self.history.stamp(mem::take(&mut self.pending));
        self.journal.record_commit(&self.staged, &records)?;

        let staged = mem::take(&mut self.staged);
        for (id, guard) in self.rows.iter_mut() {
            if let Some(balance) = staged.get(id) {
                **guard = *balance;
            }
        }
        for transaction in records {
            self.history.push(transaction);
        }

        self.committed = true;
        debug!(balances = staged.len(), "atomic scope committed");
        Ok(())
    }
}

impl<J> Drop for MemoryScope<'_, J> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(
                balances = self.staged.len(),
                records = self.pending.len(),
                "atomic scope rolled back"
            );
        }
    }
}
