//! Thread-safe wallet balance storage
//!
//! This module provides the `MemoryWalletStore` struct, which owns the balance
//! of every wallet.
//!
//! # Design
//!
//! Rows live in a `DashMap` keyed by wallet id. Each value is an
//! `Arc<Mutex<Decimal>>`, so the map shard lock is only held long enough to
//! clone the `Arc`; the balance itself is guarded by a per-row mutex. Writers
//! never hold more than one shard lock, and operations on different wallets
//! never block each other.
//!
//! Writers acquire row locks with a bounded wait. When the wait expires the
//! caller gets `LedgerError::Conflict`, which is safe to retry because nothing
//! has been written yet. Readers wait for the row without a bound.

use crate::core::traits::WalletStore;
use crate::types::{LedgerError, Wallet, WalletId};
use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Exclusive, owned lock on one wallet's balance
pub(crate) type RowGuard = ArcMutexGuard<RawMutex, Decimal>;

/// Concurrent wallet balance table
#[derive(Debug)]
pub struct MemoryWalletStore {
    /// Balance rows by wallet id
    rows: DashMap<WalletId, Arc<Mutex<Decimal>>>,

    /// Longest time to wait for a row lock before reporting a conflict
    lock_timeout: Duration,
}

impl MemoryWalletStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `lock_timeout` - Maximum wait for a single row lock
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            rows: DashMap::new(),
            lock_timeout,
        }
    }

    /// Number of wallets
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clone a row handle out of the map
    ///
    /// The shard lock is released before the caller blocks on the row.
    fn row(&self, id: &WalletId) -> Option<Arc<Mutex<Decimal>>> {
        self.rows.get(id).map(|row| Arc::clone(row.value()))
    }

    /// Insert a wallet row with the given balance
    ///
    /// Used for fresh wallets and when restoring persisted state.
    pub(crate) fn insert(&self, wallet: &Wallet) -> Result<(), LedgerError> {
        if self
            .rows
            .insert(wallet.id.clone(), Arc::new(Mutex::new(wallet.balance)))
            .is_some()
        {
            return Err(LedgerError::internal(format!(
                "wallet id collision on {}",
                wallet.id
            )));
        }
        Ok(())
    }

    /// Wait for a row without a bound, or `None` if the wallet does not exist
    ///
    /// Row locks are only ever held for the length of one transfer, so a
    /// reader always gets through.
    pub(crate) fn wait_row(&self, id: &WalletId) -> Option<RowGuard> {
        self.row(id).map(|row| row.lock_arc())
    }

    /// Lock one row for writing, or `None` if the wallet does not exist
    pub(crate) fn lock_row(&self, id: &WalletId) -> Result<Option<RowGuard>, LedgerError> {
        let row = match self.row(id) {
            Some(row) => row,
            None => return Ok(None),
        };

        match row.try_lock_arc_for(self.lock_timeout) {
            Some(guard) => Ok(Some(guard)),
            None => {
                warn!(
                    wallet = %id,
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "row lock wait timed out"
                );
                Err(LedgerError::conflict(format!(
                    "timed out waiting for wallet {}",
                    id
                )))
            }
        }
    }

    /// Lock several rows in ascending id order
    ///
    /// The order is independent of the order of `ids`, which rules out
    /// deadlock between two callers locking the same pair from opposite
    /// directions. Duplicates are locked once and unknown ids are skipped.
    /// On failure every lock taken so far is released.
    pub(crate) fn lock_rows(
        &self,
        ids: &[WalletId],
    ) -> Result<Vec<(WalletId, RowGuard)>, LedgerError> {
        let mut ordered: Vec<&WalletId> = ids.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for id in ordered {
            if let Some(guard) = self.lock_row(id)? {
                guards.push((id.clone(), guard));
            }
        }
        Ok(guards)
    }
}

impl WalletStore for MemoryWalletStore {
    fn create_wallet(&self, initial_balance: Decimal) -> Result<Wallet, LedgerError> {
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_argument(
                "initial balance must not be negative",
            ));
        }

        let wallet = Wallet::new(WalletId::generate(), initial_balance);
        self.insert(&wallet)?;

        info!(wallet = %wallet.id, balance = %initial_balance, "wallet created");
        Ok(wallet)
    }

    fn balance(&self, id: &WalletId) -> Result<Decimal, LedgerError> {
        self.wait_row(id)
            .map(|guard| *guard)
            .ok_or_else(|| LedgerError::wallet_not_found(id))
    }

    fn exists(&self, id: &WalletId) -> Result<bool, LedgerError> {
        Ok(self.rows.contains_key(id))
    }
}
