//! Transaction input types for the reward decision engine
//!
//! A [`Transaction`] is the parsed request document handed to the engine by
//! the API boundary. Validation happens here, before any engine state is
//! touched: a transaction that fails validation is a client-facing rejection,
//! not an engine failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Transaction types accepted on the wire
///
/// Only [`TxnType::Payment`] earns rewards. The remaining variants exist so
/// that the boundary can parse them and reject them with a precise
/// validation error instead of a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxnType {
    /// A purchase; the single supported type
    Payment,
    /// Money returned to the user; not rewarded
    Refund,
    /// A payment rolled back; not rewarded
    Reversal,
    /// A manual correction; not rewarded
    Adjustment,
}

impl TxnType {
    /// Wire-format name of this transaction type
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Payment => "PAYMENT",
            TxnType::Refund => "REFUND",
            TxnType::Reversal => "REVERSAL",
            TxnType::Adjustment => "ADJUSTMENT",
        }
    }
}

/// An incoming transaction to decide a reward for
///
/// The triple (`txn_id`, `user_id`, `merchant_id`) forms the idempotency key:
/// a retry carrying the same triple within TTL replays the original decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier
    pub txn_id: String,

    /// User the reward is computed for
    pub user_id: String,

    /// Merchant the transaction was made at
    pub merchant_id: String,

    /// Transaction amount in rupees; must be positive and within bounds
    pub amount: Decimal,

    /// Transaction type; only PAYMENT is rewarded
    pub txn_type: TxnType,

    /// Client-supplied timestamp, carried through unmodified
    pub ts: String,
}

impl Transaction {
    /// Validate this transaction against the active policy bounds
    ///
    /// Checks, in order: identifiers are non-empty, the type is PAYMENT, the
    /// amount is positive and does not exceed `max_amount`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered. Validation errors
    /// are client-facing rejections raised before the engine runs.
    pub fn validate(&self, max_amount: Decimal) -> Result<(), ValidationError> {
        if self.txn_id.trim().is_empty() {
            return Err(ValidationError::empty_field("txn_id"));
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::empty_field("merchant_id"));
        }
        if self.txn_type != TxnType::Payment {
            return Err(ValidationError::unsupported_txn_type(
                self.txn_type.as_str(),
                &self.txn_id,
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive_amount(self.amount));
        }
        if self.amount > max_amount {
            return Err(ValidationError::amount_too_large(self.amount, max_amount));
        }
        Ok(())
    }
}
