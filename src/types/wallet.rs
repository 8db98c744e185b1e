//! Wallet-related types for the wallet ledger
//!
//! This module defines the wallet identifier and the wallet record returned
//! by creation and status lookups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque wallet identifier
///
/// Freshly allocated ids are UUID v4 strings, but any string is accepted as a
/// lookup key so that unknown ids surface as `NotFound` rather than as a
/// parse failure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    /// Allocate a new, globally unique wallet id
    pub fn generate() -> Self {
        WalletId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WalletId {
    fn from(value: String) -> Self {
        WalletId(value)
    }
}

impl From<&str> for WalletId {
    fn from(value: &str) -> Self {
        WalletId(value.to_string())
    }
}

/// A wallet and its current balance
///
/// Wallets are created once with the configured default balance, never
/// deleted, and only mutated by committed transfers. The balance is never
/// negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// The wallet id
    pub id: WalletId,

    /// Current balance, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl Wallet {
    pub fn new(id: WalletId, balance: Decimal) -> Self {
        Wallet { id, balance }
    }
}
