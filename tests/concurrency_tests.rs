//! Concurrency property tests
//!
//! These tests hammer the engine from many OS threads and then check the
//! ledger invariants:
//! - no balance ever drops below zero
//! - concurrent debits that together exceed a balance cannot all commit
//! - opposite-direction transfers between the same pair never deadlock
//! - the sum of all balances is unchanged by transfers
//! - every committed transfer has exactly one history record

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;
    use wallet_ledger::{
        LedgerConfig, LedgerEngine, LedgerError, LedgerStore, MemoryLedgerStore, QueryService,
        WalletId,
    };

    fn services() -> (LedgerEngine, QueryService) {
        let config = LedgerConfig::new(dec!(100.0), Duration::from_secs(10));
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new(config.lock_timeout));
        (
            LedgerEngine::new(Arc::clone(&store), &config),
            QueryService::new(store),
        )
    }

    fn total(query: &QueryService, wallets: &[WalletId]) -> Decimal {
        wallets
            .iter()
            .map(|id| query.get_wallet_status(id).unwrap().balance)
            .sum()
    }

    #[test]
    fn test_two_racing_debits_cannot_overdraw() {
        for _ in 0..50 {
            let (engine, query) = services();
            let w = engine.create_wallet().unwrap().id;
            let x = engine.create_wallet().unwrap().id;
            let y = engine.create_wallet().unwrap().id;
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = [x.clone(), y.clone()]
                .into_iter()
                .map(|to| {
                    let engine = engine.clone();
                    let barrier = Arc::clone(&barrier);
                    let from = w.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        engine.transfer(&from, &to, dec!(60))
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let committed = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(committed, 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(LedgerError::InsufficientFunds { .. }))));
            assert_eq!(query.get_wallet_status(&w).unwrap().balance, dec!(40));
            assert_eq!(query.get_history(&w).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_many_small_debits_stop_at_zero() {
        let (engine, query) = services();
        let source = engine.create_wallet().unwrap().id;
        let sinks: Vec<WalletId> = (0..4).map(|_| engine.create_wallet().unwrap().id).collect();
        let mut handles = vec![];

        // 8 threads x 50 attempts x 1.0 = 400 requested against a balance of 100.
        for i in 0..8 {
            let engine = engine.clone();
            let from = source.clone();
            let to = sinks[i % sinks.len()].clone();
            handles.push(thread::spawn(move || {
                (0..50)
                    .filter(|_| engine.transfer(&from, &to, dec!(1.0)).is_ok())
                    .count()
            }));
        }
        let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(committed, 100);
        assert_eq!(query.get_wallet_status(&source).unwrap().balance, Decimal::ZERO);
        assert_eq!(query.get_history(&source).unwrap().len(), 100);
    }

    #[test]
    fn test_opposite_direction_transfers_complete_and_conserve_total() {
        let (engine, query) = services();
        let a = engine.create_wallet().unwrap().id;
        let b = engine.create_wallet().unwrap().id;
        let mut handles = vec![];

        for i in 0..8 {
            let engine = engine.clone();
            let (from, to) = if i % 2 == 0 {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            handles.push(thread::spawn(move || {
                (0..200)
                    .filter(|_| engine.transfer(&from, &to, dec!(0.5)).is_ok())
                    .count()
            }));
        }
        let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(total(&query, &[a.clone(), b.clone()]), dec!(200));
        assert!(query.get_wallet_status(&a).unwrap().balance >= Decimal::ZERO);
        assert!(query.get_wallet_status(&b).unwrap().balance >= Decimal::ZERO);
        // Each committed transfer shows up once in each participant's history.
        assert_eq!(query.get_history(&a).unwrap().len(), committed);
        assert_eq!(query.get_history(&b).unwrap().len(), committed);
    }

    #[test]
    fn test_random_traffic_preserves_invariants() {
        let (engine, query) = services();
        let wallets: Arc<Vec<WalletId>> =
            Arc::new((0..6).map(|_| engine.create_wallet().unwrap().id).collect());
        let mut handles = vec![];

        for t in 0..6usize {
            let engine = engine.clone();
            let wallets = Arc::clone(&wallets);
            handles.push(thread::spawn(move || {
                let mut committed = 0usize;
                for step in 0..300usize {
                    let from = &wallets[(t + step) % wallets.len()];
                    let to = &wallets[(t * 7 + step * 3 + 1) % wallets.len()];
                    let amount = Decimal::new(((step % 9) as i64 + 1) * 250, 2);
                    match engine.transfer(from, to, amount) {
                        Ok(()) => committed += 1,
                        Err(LedgerError::InvalidArgument { .. })
                        | Err(LedgerError::InsufficientFunds { .. }) => {}
                        Err(other) => panic!("unexpected error: {}", other),
                    }
                }
                committed
            }));
        }
        let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(total(&query, &wallets), dec!(600));

        let mut records = 0usize;
        for id in wallets.iter() {
            assert!(query.get_wallet_status(id).unwrap().balance >= Decimal::ZERO);

            let history = query.get_history(id).unwrap();
            assert!(history.iter().all(|tx| tx.involves(id)));
            assert!(history.iter().all(|tx| tx.from != tx.to && tx.amount > Decimal::ZERO));
            assert!(history.windows(2).all(|w| w[0].time <= w[1].time));
            records += history.len();

            // Replaying the history reproduces the balance.
            let replayed = history.iter().fold(dec!(100), |acc, tx| {
                if &tx.from == id {
                    acc - tx.amount
                } else {
                    acc + tx.amount
                }
            });
            assert_eq!(replayed, query.get_wallet_status(id).unwrap().balance);
        }
        // Each record is listed under both participants.
        assert_eq!(records, committed * 2);
    }

    #[test]
    fn test_disjoint_pairs_run_in_parallel() {
        let (engine, query) = services();
        let pairs: Vec<(WalletId, WalletId)> = (0..4)
            .map(|_| {
                (
                    engine.create_wallet().unwrap().id,
                    engine.create_wallet().unwrap().id,
                )
            })
            .collect();
        let barrier = Arc::new(Barrier::new(pairs.len()));
        let mut handles = vec![];

        for (from, to) in pairs.clone() {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..100 {
                    engine.transfer(&from, &to, dec!(1)).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for (from, to) in pairs {
            assert_eq!(query.get_wallet_status(&from).unwrap().balance, dec!(0));
            assert_eq!(query.get_wallet_status(&to).unwrap().balance, dec!(200));
        }
    }
}
