//! Read-only balance and history lookups

use crate::core::traits::LedgerStore;
use crate::types::{LedgerError, Transaction, Wallet, WalletId};
use std::sync::Arc;

/// Read side of the ledger
///
/// Never mutates state. Cheap to clone.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn LedgerStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        QueryService { store }
    }

    /// Current balance of a wallet
    ///
    /// Fails with `WalletNotFound` if the id is unknown.
    pub fn get_wallet_status(&self, id: &WalletId) -> Result<Wallet, LedgerError> {
        let balance = self.store.balance(id)?;
        Ok(Wallet::new(id.clone(), balance))
    }

    /// Every committed transfer the wallet took part in, oldest first
    ///
    /// Fails with `WalletNotFound` if the id is unknown; a wallet without
    /// transfers yields an empty list.
    pub fn get_history(&self, id: &WalletId) -> Result<Vec<Transaction>, LedgerError> {
        if !self.store.exists(id)? {
            return Err(LedgerError::wallet_not_found(id));
        }
        self.store.list_by_wallet(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::{LedgerEngine, MemoryLedgerStore};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn services() -> (LedgerEngine, QueryService) {
        let store: Arc<dyn LedgerStore> =
            Arc::new(MemoryLedgerStore::new(Duration::from_secs(1)));
        (
            LedgerEngine::new(Arc::clone(&store), &LedgerConfig::default()),
            QueryService::new(store),
        )
    }

    #[test]
    fn test_status_of_new_wallet() {
        let (engine, query) = services();
        let created = engine.create_wallet().unwrap();

        let status = query.get_wallet_status(&created.id).unwrap();

        assert_eq!(status, created);
        assert_eq!(status.balance, dec!(100.0));
    }

    #[test]
    fn test_status_of_unknown_wallet_is_not_found() {
        let (_engine, query) = services();
        let id = WalletId::from("unknown");

        assert_eq!(
            query.get_wallet_status(&id).unwrap_err(),
            LedgerError::wallet_not_found(&id)
        );
    }

    #[test]
    fn test_history_of_unknown_wallet_is_not_found() {
        let (_engine, query) = services();
        let id = WalletId::from("unknown");

        assert_eq!(
            query.get_history(&id).unwrap_err(),
            LedgerError::wallet_not_found(&id)
        );
    }

    #[test]
    fn test_history_of_fresh_wallet_is_empty() {
        let (engine, query) = services();
        let wallet = engine.create_wallet().unwrap();

        assert!(query.get_history(&wallet.id).unwrap().is_empty());
    }

    #[test]
    fn test_history_is_ordered_and_complete() {
        let (engine, query) = services();
        let a = engine.create_wallet().unwrap().id;
        let b = engine.create_wallet().unwrap().id;
        let c = engine.create_wallet().unwrap().id;

        engine.transfer(&a, &b, dec!(10)).unwrap();
        engine.transfer(&b, &c, dec!(5)).unwrap();
        engine.transfer(&c, &a, dec!(1)).unwrap();

        let history = query.get_history(&a).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|t| t.involves(&a)));
        assert!(history.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(history[0].amount, dec!(10));
        assert_eq!(history[1].amount, dec!(1));
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let (engine, query) = services();
        let a = engine.create_wallet().unwrap().id;
        let b = engine.create_wallet().unwrap().id;
        engine.transfer(&a, &b, dec!(10)).unwrap();

        let before = (query.get_wallet_status(&a).unwrap(), query.get_history(&a).unwrap());
        for _ in 0..3 {
            query.get_wallet_status(&a).unwrap();
            query.get_history(&a).unwrap();
        }
        let after = (query.get_wallet_status(&a).unwrap(), query.get_history(&a).unwrap());

        assert_eq!(before, after);
    }
}
