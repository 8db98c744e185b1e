//! Request bodies accepted by the HTTP gateway
//!
//! Responses reuse the domain types directly ([`crate::types::Wallet`] and
//! [`crate::types::Transaction`]), so only inbound bodies live here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/wallet/:wallet_id/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Recipient wallet id
    pub to: String,

    /// Amount to move, as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::float(r#"{"to":"b","amount":40.5}"#, dec!(40.5))]
    #[case::integer(r#"{"to":"b","amount":40}"#, dec!(40))]
    fn test_deserialize(#[case] body: &str, #[case] expected: Decimal) {
        let request: TransferRequest = serde_json::from_str(body).unwrap();

        assert_eq!(request.to, "b");
        assert_eq!(request.amount, expected);
    }

    #[rstest]
    #[case::missing_amount(r#"{"to":"b"}"#)]
    #[case::missing_to(r#"{"amount":1.0}"#)]
    #[case::not_json("amount=1")]
    fn test_deserialize_rejects(#[case] body: &str) {
        assert!(serde_json::from_str::<TransferRequest>(body).is_err());
    }
}
