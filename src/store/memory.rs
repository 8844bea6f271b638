//! In-process key-value store backed by DashMap
//!
//! `MemoryStore` implements the [`KeyValueStore`] contract with a concurrent
//! map and lazy TTL expiry: an expired entry is treated as absent and removed
//! when next touched. Expiry is wall-clock based per entry, so the store
//! needs no background sweeper.
//!
//! # Thread Safety
//!
//! DashMap provides fine-grained locking through internal sharding. `incrby`
//! runs under the entry lock of its key, so concurrent increments of the
//! same counter never under- or double-count.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::KeyValueStore;
use crate::types::StoreError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// DashMap-backed in-process store with TTL expiry
///
/// The development and test implementation of the store contract. All
/// operations are infallible here; the error paths of [`KeyValueStore`]
/// exist for networked implementations and are exercised in tests through
/// failing store doubles.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    /// Whether the store holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Drop the read guard before removing, DashMap deadlocks otherwise
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn incrby(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new("0".to_string(), ttl));

        let current = if entry.is_expired() {
            0
        } else {
            entry.value.parse::<i64>().map_err(|_| {
                StoreError::unavailable(format!("value at '{key}' is not an integer"))
            })?
        };

        let new_value = current.saturating_add(delta);
        *entry = Entry::new(new_value.to_string(), ttl);
        Ok(new_value)
    }
}
