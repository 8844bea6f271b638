//! Decision replay cache
//!
//! Fresh decisions are cached as JSON under the request's idempotency key so
//! that retries within the TTL get the original decision back instead of
//! re-running the rules and re-applying side effects.
//!
//! Writes are fire-and-forget: the decision has already been computed and
//! its side effects applied, so a failed cache write only costs replay
//! protection for that one request. Reads degrade to a miss on failure,
//! timeout, or an undecodable cached value.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::store::{self, keys, KeyValueStore};
use crate::types::{RewardDecision, Transaction};

/// Replay cache over the shared store
pub struct IdempotencyCache {
    store: Arc<dyn KeyValueStore>,
}

impl IdempotencyCache {
    /// Create a cache over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Previously cached decision for this transaction, if any
    ///
    /// Any failure (store error, timeout, undecodable value) is logged and
    /// treated as a miss, letting the request proceed as a fresh decision.
    pub async fn lookup(&self, txn: &Transaction, timeout: Duration) -> Option<RewardDecision> {
        let key = keys::idempotency(&txn.txn_id, &txn.user_id, &txn.merchant_id);
        let raw = match store::get_with_timeout(self.store.as_ref(), &key, timeout).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "idempotency lookup failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(decision) => Some(decision),
            Err(e) => {
                warn!(key = %key, error = %e, "cached decision undecodable, treating as miss");
                None
            }
        }
    }

    /// Cache a fresh decision without blocking the caller
    ///
    /// The write runs on a spawned task; the returned handle exists so tests
    /// can await completion, callers in the request path drop it.
    pub fn store(
        &self,
        txn: &Transaction,
        decision: &RewardDecision,
        ttl: Duration,
    ) -> JoinHandle<()> {
        let key = keys::idempotency(&txn.txn_id, &txn.user_id, &txn.merchant_id);
        let payload = match serde_json::to_string(decision) {
            Ok(payload) => payload,
            Err(e) => {
                // Unreachable for our own types, but never worth a panic
                warn!(key = %key, error = %e, "decision failed to serialize, not caching");
                return tokio::spawn(async {});
            }
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.set(&key, payload, ttl).await {
                warn!(key = %key, error = %e, "idempotency write failed, replay unprotected");
            }
        })
    }
}
