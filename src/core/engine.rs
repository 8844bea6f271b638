//! The reward decision engine
//!
//! `DecisionEngine` owns the full request path: validate the transaction,
//! answer replays from the idempotency cache, resolve the persona, read the
//! daily cashback ledger, apply the decision rules of the active policy
//! snapshot, and apply side effects.
//!
//! # Decision rules
//!
//! Evaluated in order against the persona's tier; the first match wins:
//!
//! 1. Daily cashback limit already reached: grant XP.
//! 2. `prefer_gold` set and persona is POWER: grant the flat gold value.
//! 3. `prefer_xp` set: grant XP.
//! 4. Otherwise grant cashback, capped by the remaining daily headroom, the
//!    transaction's XP value, and the percentage cap. A cashback grant of 0
//!    is still a CASHBACK decision.
//!
//! # Degradation
//!
//! Store reads degrade to safe defaults (counter 0, ledger 0, cache miss)
//! and store writes are dropped with a warning. A request fails only on
//! invalid input or a truly unexpected internal condition.

use std::sync::Arc;

use chrono::Local;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::cac::CacLedger;
use super::idempotency::IdempotencyCache;
use super::overrides::PersonaOverride;
use super::persona::PersonaClassifier;
use crate::config::{ConfigStore, PolicyConfig};
use crate::store::KeyValueStore;
use crate::types::{
    DecisionMeta, EngineError, Persona, ReasonCode, RewardDecision, RewardType, Transaction,
};

/// Computes reward decisions against the active policy snapshot
pub struct DecisionEngine {
    config: Arc<ConfigStore>,
    classifier: PersonaClassifier,
    ledger: CacLedger,
    idempotency: IdempotencyCache,
}

impl DecisionEngine {
    /// Assemble an engine over a store, config store, and override source
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: Arc<ConfigStore>,
        overrides: Arc<dyn PersonaOverride>,
    ) -> Self {
        Self {
            config,
            classifier: PersonaClassifier::new(Arc::clone(&store), overrides),
            ledger: CacLedger::new(Arc::clone(&store)),
            idempotency: IdempotencyCache::new(store),
        }
    }

    /// Compute (or replay) the reward decision for one transaction
    ///
    /// The policy snapshot is taken once at entry; a concurrent reload does
    /// not affect an in-flight decision.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for rejected input. Store failures never
    /// fail the request; they degrade per the module contract.
    pub async fn decide(&self, txn: &Transaction) -> Result<RewardDecision, EngineError> {
        let config = self.config.get_active();
        let timeout = config.store.op_timeout();

        txn.validate(config.max_txn_amount)?;

        if let Some(cached) = self.idempotency.lookup(txn, timeout).await {
            info!(
                txn_id = %txn.txn_id,
                decision_id = %cached.decision_id,
                "replayed cached decision"
            );
            return Ok(cached);
        }

        let resolution = self.classifier.resolve(&txn.user_id, &config, timeout).await;
        let tier = config
            .tier(resolution.persona)
            .ok_or_else(|| EngineError::internal("active snapshot has no tier for persona"))?;

        let today = Local::now().date_naive();
        let used = self.ledger.get_used(&txn.user_id, today, timeout).await;
        let remaining = CacLedger::remaining(used, tier.daily_limit);

        let xp = compute_xp(
            txn.amount,
            config.xp_per_rupee,
            tier.multiplier,
            config.max_xp_per_txn,
        );

        let (reward_type, reward_value, reason) = if remaining == 0 {
            (RewardType::Xp, xp, ReasonCode::CacLimitExceeded)
        } else if config.feature_flags.prefer_gold && resolution.persona == Persona::Power {
            (RewardType::Gold, config.gold_reward_value, ReasonCode::GoldGranted)
        } else if config.feature_flags.prefer_xp {
            (RewardType::Xp, xp, ReasonCode::XpPreferred)
        } else {
            let percentage_cap = decimal_floor(txn.amount * config.max_cashback_percentage);
            let cashback = remaining.min(xp).min(percentage_cap);
            (RewardType::Cashback, cashback, ReasonCode::CashbackGranted)
        };

        let decision = RewardDecision {
            decision_id: Uuid::new_v4().to_string(),
            policy_version: config.policy_version.clone(),
            reward_type,
            reward_value,
            xp,
            reason_codes: vec![reason],
            meta: DecisionMeta {
                persona: resolution.persona,
                daily_cac_used: used,
                daily_cac_limit: tier.daily_limit,
            },
        };

        self.apply_side_effects(txn, &decision, &config, today).await;

        info!(
            txn_id = %txn.txn_id,
            user_id = %txn.user_id,
            persona = %resolution.persona,
            reward_type = ?decision.reward_type,
            reward_value = decision.reward_value,
            reason = ?reason,
            policy_version = %decision.policy_version,
            "decision computed"
        );
        Ok(decision)
    }

    /// Apply the write path of a fresh decision
    ///
    /// Every write here is best-effort and bounded by the store timeout: the
    /// decision stands even when the counter bump, the ledger add, or the
    /// idempotency write is lost, and a store that hangs instead of erroring
    /// cannot stall the response.
    async fn apply_side_effects(
        &self,
        txn: &Transaction,
        decision: &RewardDecision,
        config: &PolicyConfig,
        today: chrono::NaiveDate,
    ) {
        let op_timeout = config.store.op_timeout();

        let persona_ttl = std::time::Duration::from_secs(config.cache.persona_ttl);
        match tokio::time::timeout(
            op_timeout,
            self.classifier.record_transaction(&txn.user_id, persona_ttl),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(user_id = %txn.user_id, error = %e, "txn counter not advanced");
            }
            Err(_) => {
                warn!(user_id = %txn.user_id, "txn counter write timed out, not advanced");
            }
        }

        if decision.reward_type == RewardType::Cashback && decision.reward_value > 0 {
            let ttl = CacLedger::ttl_to_midnight(Local::now())
                .min(std::time::Duration::from_secs(config.cache.cac_ttl));
            match tokio::time::timeout(
                op_timeout,
                self.ledger
                    .add(&txn.user_id, today, decision.reward_value as i64, ttl),
            )
            .await
            {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(user_id = %txn.user_id, error = %e, "cashback ledger not updated");
                }
                Err(_) => {
                    warn!(user_id = %txn.user_id, "cashback ledger write timed out, not updated");
                }
            }
        }

        let idem_ttl = std::time::Duration::from_secs(config.cache.idempotency_ttl);
        // Fire and forget; the handle is dropped
        let _ = self.idempotency.store(txn, decision, idem_ttl);
    }
}

/// XP of a transaction: floor(amount * rate * multiplier), capped per txn
fn compute_xp(amount: Decimal, xp_per_rupee: Decimal, multiplier: Decimal, max_xp: u64) -> u64 {
    decimal_floor(amount * xp_per_rupee * multiplier).min(max_xp)
}

/// Truncate a non-negative decimal to u64, flooring anything negative to 0
fn decimal_floor(value: Decimal) -> u64 {
    value.trunc().to_u64().unwrap_or(0)
}
