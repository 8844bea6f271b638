//! Key layout shared across store implementations
//!
//! The layout must match across engine instances pointing at the same store:
//!
//! - `idem:{txn_id}:{user_id}:{merchant_id}` - cached decisions
//! - `txn_count:{user_id}` - per-user transaction counter
//! - `cac:{user_id}:{YYYY-MM-DD}` - daily cashback ledger

use chrono::NaiveDate;

/// Idempotency key for a decision request
pub fn idempotency(txn_id: &str, user_id: &str, merchant_id: &str) -> String {
    format!("idem:{txn_id}:{user_id}:{merchant_id}")
}

/// Per-user transaction counter key
pub fn txn_count(user_id: &str) -> String {
    format!("txn_count:{user_id}")
}

/// Daily cashback ledger key for a (user, calendar day) pair
pub fn daily_cac(user_id: &str, date: NaiveDate) -> String {
    format!("cac:{user_id}:{date}")
}
