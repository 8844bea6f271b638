//! Error types for the reward decision engine
//!
//! This module defines all error types that can occur while computing a
//! reward decision. The taxonomy mirrors how errors propagate:
//!
//! - **Validation errors**: rejected before the engine runs, surfaced to the
//!   caller as a client-facing rejection.
//! - **Config errors**: a policy document failed to load or validate; the
//!   previously active snapshot stays in place and only the reload caller
//!   sees the failure.
//! - **Store errors**: transient key-value store failures. These are absorbed
//!   at the call site — reads degrade to safe defaults, writes are dropped —
//!   and never fail a request.
//! - **Internal errors**: unexpected conditions, surfaced with a trace id.

use rust_decimal::Decimal;
use thiserror::Error;

/// Client-facing input validation failure
///
/// Raised by [`crate::types::Transaction::validate`] before a transaction
/// reaches the decision engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Transaction amount is zero or negative
    #[error("Amount must be greater than 0, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Transaction amount exceeds the configured upper bound
    #[error("Amount {amount} exceeds maximum allowed value {max}")]
    AmountTooLarge {
        /// The rejected amount
        amount: Decimal,
        /// Configured maximum
        max: Decimal,
    },

    /// Only PAYMENT transactions earn rewards
    #[error("Unsupported transaction type '{txn_type}' for transaction {txn_id}")]
    UnsupportedTxnType {
        /// The rejected transaction type
        txn_type: String,
        /// Transaction ID
        txn_id: String,
    },

    /// A required identifier is empty or whitespace-only
    #[error("Field '{field}' cannot be empty")]
    EmptyField {
        /// Name of the offending field
        field: &'static str,
    },
}

impl ValidationError {
    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(amount: Decimal) -> Self {
        ValidationError::NonPositiveAmount { amount }
    }

    /// Create an AmountTooLarge error
    pub fn amount_too_large(amount: Decimal, max: Decimal) -> Self {
        ValidationError::AmountTooLarge { amount, max }
    }

    /// Create an UnsupportedTxnType error
    pub fn unsupported_txn_type(txn_type: &str, txn_id: &str) -> Self {
        ValidationError::UnsupportedTxnType {
            txn_type: txn_type.to_string(),
            txn_id: txn_id.to_string(),
        }
    }

    /// Create an EmptyField error
    pub fn empty_field(field: &'static str) -> Self {
        ValidationError::EmptyField { field }
    }
}

/// Policy document load/reload failure
///
/// Reported to the reload caller only; the previously active snapshot is
/// never replaced by a partially applied or invalid document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The policy document could not be read
    #[error("Failed to read policy document {path}: {message}")]
    Io {
        /// Path of the document
        path: String,
        /// Underlying I/O error description
        message: String,
    },

    /// The policy document is not valid YAML
    #[error("Invalid YAML in policy document: {message}")]
    Parse {
        /// Parser error description
        message: String,
    },

    /// The policy document parsed but failed semantic validation
    #[error("Invalid policy document: {reason}")]
    Invalid {
        /// What the validation check found
        reason: String,
    },
}

impl ConfigError {
    /// Create an Invalid error
    pub fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}

/// Transient key-value store failure
///
/// Absorbed by the degradation contract: reads fall back to safe defaults
/// with a warning log, writes are dropped with a warning log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store rejected or could not complete the operation
    #[error("Key-value store unavailable: {message}")]
    Unavailable {
        /// Underlying failure description
        message: String,
    },

    /// The operation exceeded its bounded timeout
    #[error("Key-value store operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },
}

impl StoreError {
    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

/// Daily cashback ledger failure
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A negative delta is a programming error, never a user-facing failure
    #[error("Negative cashback delta {delta} for user {user_id}")]
    NegativeDelta {
        /// User whose ledger was addressed
        user_id: String,
        /// The rejected delta
        delta: i64,
    },

    /// The underlying store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level failure of a decision request
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before the engine ran
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unexpected failure, surfaced with a trace id and never retried
    #[error("Reward decision failed (trace {trace_id}): {message}")]
    Internal {
        /// Generated identifier for correlating logs
        trace_id: String,
        /// Failure description
        message: String,
    },
}

impl EngineError {
    /// Create an Internal error with a fresh trace id
    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            trace_id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::non_positive(
        ValidationError::non_positive_amount(Decimal::ZERO),
        "Amount must be greater than 0, got 0"
    )]
    #[case::too_large(
        ValidationError::amount_too_large(Decimal::new(2_000_000, 0), Decimal::new(1_000_000, 0)),
        "Amount 2000000 exceeds maximum allowed value 1000000"
    )]
    #[case::unsupported_type(
        ValidationError::unsupported_txn_type("REFUND", "t-1"),
        "Unsupported transaction type 'REFUND' for transaction t-1"
    )]
    #[case::empty_field(
        ValidationError::empty_field("user_id"),
        "Field 'user_id' cannot be empty"
    )]
    fn test_validation_error_display(#[case] error: ValidationError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::unavailable(
        StoreError::unavailable("connection refused"),
        "Key-value store unavailable: connection refused"
    )]
    #[case::timeout(
        StoreError::Timeout { timeout_ms: 250 },
        "Key-value store operation timed out after 250ms"
    )]
    fn test_store_error_display(#[case] error: StoreError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::invalid("tiers must not be empty");
        assert_eq!(
            error.to_string(),
            "Invalid policy document: tiers must not be empty"
        );
    }

    #[test]
    fn test_ledger_error_wraps_store_error() {
        let error: LedgerError = StoreError::unavailable("down").into();
        assert_eq!(error.to_string(), "Key-value store unavailable: down");
    }

    #[test]
    fn test_internal_error_carries_trace_id() {
        let error = EngineError::internal("boom");
        match &error {
            EngineError::Internal { trace_id, message } => {
                assert!(!trace_id.is_empty());
                assert_eq!(message, "boom");
            }
            _ => panic!("Expected Internal error"),
        }
    }
}
