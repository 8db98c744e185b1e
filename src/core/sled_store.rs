//! Durable ledger store on sled
//!
//! `SledJournal` persists wallets and committed transfers in an embedded
//! sled database. `SledLedgerStore` is the locking store over that journal:
//! it serves reads from memory and writes every commit through to disk
//! before publishing it.
//!
//! ## Tree Layout
//!
//! | Tree      | Key                    | Value                         |
//! |-----------|------------------------|-------------------------------|
//! | `wallets` | wallet id (UTF-8)      | balance (`Decimal::serialize`)|
//! | `history` | sequence (8B BE)       | `bincode(StoredTransaction)`  |
//!
//! Sequence numbers come from `Db::generate_id` and are drawn while the
//! participants' rows are locked. Because they are big-endian, iterating the
//! `history` tree replays every wallet's transfers in commit order.
//!
//! ## Atomicity
//!
//! A scope's balances and history records are written in one sled
//! transaction spanning both trees, then flushed. Either all of a transfer
//! reaches disk or none of it does.

use crate::core::store::{Journal, LockingLedgerStore};
use crate::types::{LedgerError, Transaction, Wallet, WalletId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Ledger store persisted in a sled database
pub type SledLedgerStore = LockingLedgerStore<SledJournal>;

/// History record as laid out on disk
///
/// Amounts keep their exact decimal representation.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTransaction {
    time: DateTime<Utc>,
    from: String,
    to: String,
    amount: [u8; 16],
}

impl From<&Transaction> for StoredTransaction {
    fn from(transaction: &Transaction) -> Self {
        StoredTransaction {
            time: transaction.time,
            from: transaction.from.as_str().to_string(),
            to: transaction.to.as_str().to_string(),
            amount: transaction.amount.serialize(),
        }
    }
}

impl From<StoredTransaction> for Transaction {
    fn from(stored: StoredTransaction) -> Self {
        Transaction {
            time: stored.time,
            from: WalletId::from(stored.from),
            to: WalletId::from(stored.to),
            amount: Decimal::deserialize(stored.amount),
        }
    }
}

fn storage_error(context: &str, err: impl fmt::Display) -> LedgerError {
    LedgerError::internal(format!("{}: {}", context, err))
}

fn decode_balance(bytes: &[u8]) -> Result<Decimal, LedgerError> {
    let raw: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LedgerError::internal(format!("corrupt balance of {} bytes", bytes.len())))?;
    Ok(Decimal::deserialize(raw))
}

/// Journal writing wallets and committed transfers to sled
#[derive(Debug, Clone)]
pub struct SledJournal {
    db: Db,
    wallets: Tree,
    history: Tree,
}

impl SledJournal {
    /// Open or create a database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(|err| storage_error("failed to open database", err))?;
        Self::from_db(db)
    }

    /// Create a database that is removed when dropped
    pub fn open_temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|err| storage_error("failed to open database", err))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, LedgerError> {
        let wallets = db
            .open_tree("wallets")
            .map_err(|err| storage_error("failed to open wallets tree", err))?;
        let history = db
            .open_tree("history")
            .map_err(|err| storage_error("failed to open history tree", err))?;

        Ok(Self {
            db,
            wallets,
            history,
        })
    }

    /// Every persisted wallet with its balance
    pub fn load_wallets(&self) -> Result<Vec<Wallet>, LedgerError> {
        self.wallets
            .iter()
            .map(|entry| {
                let (key, value) = entry.map_err(|err| storage_error("failed to read wallet", err))?;
                let id = String::from_utf8(key.to_vec())
                    .map_err(|err| storage_error("corrupt wallet id", err))?;
                Ok(Wallet::new(WalletId::from(id), decode_balance(&value)?))
            })
            .collect()
    }

    /// Every persisted transfer in commit order
    pub fn load_history(&self) -> Result<Vec<Transaction>, LedgerError> {
        self.history
            .iter()
            .values()
            .map(|value| {
                let bytes = value.map_err(|err| storage_error("failed to read history", err))?;
                let stored: StoredTransaction = bincode::deserialize(&bytes)
                    .map_err(|err| storage_error("corrupt history record", err))?;
                Ok(Transaction::from(stored))
            })
            .collect()
    }

    fn flush(&self) -> Result<(), LedgerError> {
        self.db
            .flush()
            .map_err(|err| storage_error("failed to flush database", err))?;
        Ok(())
    }
}

impl Journal for SledJournal {
    fn record_wallet(&self, wallet: &Wallet) -> Result<(), LedgerError> {
        self.wallets
            .insert(wallet.id.as_str().as_bytes(), &wallet.balance.serialize()[..])
            .map_err(|err| storage_error("failed to write wallet", err))?;
        self.flush()
    }

    fn record_commit(
        &self,
        balances: &HashMap<WalletId, Decimal>,
        records: &[Transaction],
    ) -> Result<(), LedgerError> {
        let mut encoded = Vec::with_capacity(records.len());
        for record in records {
            let sequence = self
                .db
                .generate_id()
                .map_err(|err| storage_error("failed to allocate history key", err))?;
            let bytes = bincode::serialize(&StoredTransaction::from(record))
                .map_err(|err| storage_error("failed to encode history record", err))?;
            encoded.push((sequence.to_be_bytes(), bytes));
        }

        (&self.wallets, &self.history)
            .transaction(|(wallets, history)| {
                for (id, balance) in balances {
                    wallets.insert(id.as_str().as_bytes(), &balance.serialize()[..])?;
                }
                for (key, bytes) in &encoded {
                    history.insert(&key[..], bytes.clone())?;
                }
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|err: TransactionError<()>| {
                LedgerError::internal(format!("failed to write commit: {:?}", err))
            })?;

        self.flush()
    }
}

impl LockingLedgerStore<SledJournal> {
    /// Open the database at `path` and load its wallets and history
    ///
    /// # Arguments
    ///
    /// * `path` - Database directory, created if missing
    /// * `lock_timeout` - Maximum wait for any single wallet row lock
    pub fn open<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Result<Self, LedgerError> {
        Self::from_journal(SledJournal::open(path)?, lock_timeout)
    }

    /// Open a throwaway database, removed when the store is dropped
    pub fn open_temporary(lock_timeout: Duration) -> Result<Self, LedgerError> {
        Self::from_journal(SledJournal::open_temporary()?, lock_timeout)
    }

    fn from_journal(journal: SledJournal, lock_timeout: Duration) -> Result<Self, LedgerError> {
        let wallets = journal.load_wallets()?;
        let history = journal.load_history()?;

        let store = Self::with_journal(journal, lock_timeout);
        store.restore(wallets, history)?;
        Ok(store)
    }
}
