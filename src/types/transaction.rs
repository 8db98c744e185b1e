//! Transaction-related types for the wallet ledger
//!
//! A [`Transaction`] is the immutable history record written exactly once for
//! every committed transfer, atomically with the two balance mutations it
//! documents.

use super::wallet::WalletId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Committed transfer record
///
/// Invariants: `from != to` and `amount > 0`. Records are never modified
/// after they are appended to the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// UTC commit time
    pub time: DateTime<Utc>,

    /// Debited wallet
    pub from: WalletId,

    /// Credited wallet
    pub to: WalletId,

    /// Amount moved, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl Transaction {
    /// Create a record stamped with the current time
    pub fn new(from: WalletId, to: WalletId, amount: Decimal) -> Self {
        Transaction {
            time: Utc::now(),
            from,
            to,
            amount,
        }
    }

    /// Whether `wallet` took part in this transfer on either side
    pub fn involves(&self, wallet: &WalletId) -> bool {
        &self.from == wallet || &self.to == wallet
    }
}
