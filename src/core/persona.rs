//! Persona classification from transaction counts
//!
//! The classifier derives a user's behavioral tier from their transaction
//! counter and the ordered tier list of the active policy snapshot. The
//! derivation is a pure function of the count; because the counter only ever
//! grows, the persona never regresses.
//!
//! The count used for a decision includes the in-flight transaction: a
//! user's stored count says how many transactions came before, and the
//! current one is the `stored + 1`-th. The stored counter itself is advanced
//! only by [`PersonaClassifier::record_transaction`], which uses the store's
//! atomic increment and is therefore safe under arbitrarily many concurrent
//! callers for the same user.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::overrides::PersonaOverride;
use crate::config::{PersonaTier, PolicyConfig};
use crate::store::{self, keys, KeyValueStore};
use crate::types::{Persona, StoreError};

/// Outcome of resolving a user's persona for one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaResolution {
    /// Transaction count including the in-flight transaction
    pub txn_count: u64,

    /// Persona used for this decision (override applied, if any)
    pub persona: Persona,

    /// Persona derived from the counter, before any override
    pub derived: Persona,
}

impl PersonaResolution {
    /// Whether an override replaced the derived persona
    pub fn overridden(&self) -> bool {
        self.persona != self.derived
    }
}

/// Derives personas and advances the per-user transaction counter
pub struct PersonaClassifier {
    store: Arc<dyn KeyValueStore>,
    overrides: Arc<dyn PersonaOverride>,
}

impl PersonaClassifier {
    /// Create a classifier over the given store and override source
    pub fn new(store: Arc<dyn KeyValueStore>, overrides: Arc<dyn PersonaOverride>) -> Self {
        Self { store, overrides }
    }

    /// Highest tier whose threshold is at or below `txn_count`
    ///
    /// `tiers` must be ordered by ascending `min_txn_count` with the first
    /// at 0, which [`PolicyConfig::validate`] guarantees.
    pub fn classify(tiers: &[PersonaTier], txn_count: u64) -> Persona {
        tiers
            .iter()
            .take_while(|tier| tier.min_txn_count <= txn_count)
            .last()
            .map(|tier| tier.persona)
            .unwrap_or(Persona::New)
    }

    /// Resolve the persona and effective count for one decision
    ///
    /// Reads the stored counter (0 if absent; 0 with a warning if the store
    /// is unavailable or times out), counts the in-flight transaction,
    /// derives the persona, and applies any override. The override replaces
    /// the derived persona for this decision only and never alters the
    /// stored counter.
    pub async fn resolve(
        &self,
        user_id: &str,
        config: &PolicyConfig,
        timeout: Duration,
    ) -> PersonaResolution {
        let stored = self.read_count(user_id, timeout).await;
        let txn_count = stored.saturating_add(1);
        let derived = Self::classify(&config.tiers, txn_count);
        let persona = self
            .overrides
            .lookup(user_id)
            .await
            .unwrap_or(derived);

        PersonaResolution {
            txn_count,
            persona,
            derived,
        }
    }

    /// Atomically advance the user's transaction counter by exactly 1
    ///
    /// # Errors
    ///
    /// Propagates the [`StoreError`] for the caller to absorb per the
    /// degradation contract; the counter is simply not advanced.
    pub async fn record_transaction(
        &self,
        user_id: &str,
        ttl: Duration,
    ) -> Result<i64, StoreError> {
        self.store.incrby(&keys::txn_count(user_id), 1, ttl).await
    }

    /// Read the stored counter, degrading to 0 on any failure
    async fn read_count(&self, user_id: &str, timeout: Duration) -> u64 {
        let key = keys::txn_count(user_id);
        match store::get_with_timeout(self.store.as_ref(), &key, timeout).await {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(count) => count.max(0) as u64,
                Err(_) => {
                    warn!(user_id = %user_id, value = %raw, "unparseable txn count, treating as 0");
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "txn count read failed, degrading to 0");
                0
            }
        }
    }
}
