//! Key-value store boundary
//!
//! The engine consumes its backing store exclusively through the
//! [`KeyValueStore`] contract: async get / set / atomic-increment, all
//! TTL-bound. Any operation may fail with a transient [`StoreError`]; the
//! engine's degradation paths decide what happens next, never this layer.
//!
//! `MemoryStore` is the shipped in-process implementation, backed by DashMap
//! with lazy TTL expiry. A networked store slots in behind the same trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::StoreError;

pub mod keys;
pub mod memory;

pub use memory::MemoryStore;

/// Contract of the backing key-value store
///
/// All values are strings; counters are stored as their decimal
/// representation so that [`KeyValueStore::incrby`] can operate on them
/// atomically.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, or `None` if the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value with a TTL, replacing any previous value
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically add `delta` to an integer value and (re)set its TTL
    ///
    /// An absent or expired key counts as 0. Returns the new value. This is
    /// the only mutation primitive the engine relies on for counters and
    /// ledgers: it performs no read-modify-write on the caller's side, so it
    /// is safe under arbitrarily many concurrent callers for the same key.
    async fn incrby(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, StoreError>;
}

/// Read a key with a bounded timeout
///
/// A timeout maps to [`StoreError::Timeout`] so that callers route it to the
/// same degraded-default path as any other transient store failure instead
/// of blocking the request.
pub async fn get_with_timeout(
    store: &dyn KeyValueStore,
    key: &str,
    timeout: Duration,
) -> Result<Option<String>, StoreError> {
    match tokio::time::timeout(timeout, store.get(key)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
