//! Policy snapshot document model
//!
//! A [`PolicyConfig`] is an immutable, versioned bundle of every
//! business-rule parameter: feature flags, XP settings, the cashback
//! percentage cap, the ordered persona tier list, cache TTLs, store
//! settings, and persona override sources. A snapshot is validated as a
//! whole before it can become active and is never mutated in place —
//! see [`crate::config::ConfigStore`] for the swap protocol.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Persona};

/// Feature flags steering the decision rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Grant XP instead of cashback whenever the cap allows it
    #[serde(default)]
    pub prefer_xp: bool,

    /// Grant GOLD to POWER users instead of cashback
    #[serde(default)]
    pub prefer_gold: bool,
}

/// One persona tier: threshold, reward multiplier, and daily cashback limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaTier {
    /// Persona this tier maps to
    pub persona: Persona,

    /// Lowest transaction count that qualifies for this tier
    pub min_txn_count: u64,

    /// XP multiplier applied to transactions of this tier
    pub multiplier: Decimal,

    /// Daily cashback cap in rupees
    pub daily_limit: u64,
}

/// Cache TTLs in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtls {
    /// TTL of the per-user transaction counter (default: 30 days)
    #[serde(default = "CacheTtls::default_persona_ttl")]
    pub persona_ttl: u64,

    /// Upper bound on a daily ledger entry's TTL (default: 1 day)
    ///
    /// Ledger entries expire at the day boundary; this caps the computed
    /// TTL for clock-skewed hosts.
    #[serde(default = "CacheTtls::default_cac_ttl")]
    pub cac_ttl: u64,

    /// TTL of cached decisions under the idempotency key (default: 1 day)
    #[serde(default = "CacheTtls::default_idempotency_ttl")]
    pub idempotency_ttl: u64,
}

impl CacheTtls {
    fn default_persona_ttl() -> u64 {
        2_592_000
    }

    fn default_cac_ttl() -> u64 {
        86_400
    }

    fn default_idempotency_ttl() -> u64 {
        86_400
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            persona_ttl: Self::default_persona_ttl(),
            cac_ttl: Self::default_cac_ttl(),
            idempotency_ttl: Self::default_idempotency_ttl(),
        }
    }
}

/// Key-value store connection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Bounded per-operation timeout in milliseconds (default: 5000)
    ///
    /// A read that exceeds this routes to the degraded-default path instead
    /// of blocking the request.
    #[serde(default = "StoreSettings::default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl StoreSettings {
    fn default_op_timeout_ms() -> u64 {
        5_000
    }

    /// The timeout as a [`Duration`]
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            op_timeout_ms: Self::default_op_timeout_ms(),
        }
    }
}

/// Persona override configuration
///
/// Overrides replace the derived persona for a single decision; they never
/// touch the stored counter. Sources are consulted in order: static map
/// first, then the JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSettings {
    /// Master switch; when false, no override source is consulted
    #[serde(default)]
    pub enabled: bool,

    /// user_id -> persona pairs embedded in the policy document
    #[serde(default)]
    pub static_map: HashMap<String, Persona>,

    /// Path of a JSON file of user_id -> persona pairs
    #[serde(default)]
    pub json_file_path: Option<PathBuf>,
}

fn default_gold_reward_value() -> u64 {
    50
}

fn default_max_txn_amount() -> Decimal {
    Decimal::new(1_000_000, 0)
}

/// An immutable, versioned policy snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Version label reported in every decision
    pub policy_version: String,

    /// Decision-rule feature flags
    #[serde(default)]
    pub feature_flags: FeatureFlags,

    /// XP earned per rupee before the tier multiplier
    pub xp_per_rupee: Decimal,

    /// Hard cap on XP per transaction
    pub max_xp_per_txn: u64,

    /// Cashback cap as a fraction of the transaction amount, in [0, 1]
    pub max_cashback_percentage: Decimal,

    /// Flat value granted on GOLD decisions
    #[serde(default = "default_gold_reward_value")]
    pub gold_reward_value: u64,

    /// Upper validation bound on transaction amounts
    #[serde(default = "default_max_txn_amount")]
    pub max_txn_amount: Decimal,

    /// Persona tiers, ordered by ascending `min_txn_count`
    pub tiers: Vec<PersonaTier>,

    /// Cache TTLs
    #[serde(default)]
    pub cache: CacheTtls,

    /// Store connection settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Persona override sources
    #[serde(default)]
    pub persona_overrides: OverrideSettings,
}

impl PolicyConfig {
    /// Validate this snapshot as a whole
    ///
    /// A snapshot that fails any check here never becomes active; the store
    /// keeps serving the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first failed check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy_version.trim().is_empty() {
            return Err(ConfigError::invalid("policy_version must not be empty"));
        }
        if self.xp_per_rupee < Decimal::ZERO {
            return Err(ConfigError::invalid("xp_per_rupee must be non-negative"));
        }
        if self.max_cashback_percentage < Decimal::ZERO
            || self.max_cashback_percentage > Decimal::ONE
        {
            return Err(ConfigError::invalid(
                "max_cashback_percentage must be a fraction in [0, 1]",
            ));
        }
        if self.max_txn_amount <= Decimal::ZERO {
            return Err(ConfigError::invalid("max_txn_amount must be positive"));
        }
        if self.tiers.is_empty() {
            return Err(ConfigError::invalid("tiers must not be empty"));
        }
        if self.tiers[0].min_txn_count != 0 {
            return Err(ConfigError::invalid(
                "the first tier must have min_txn_count 0",
            ));
        }
        for pair in self.tiers.windows(2) {
            if pair[1].min_txn_count <= pair[0].min_txn_count {
                return Err(ConfigError::invalid(
                    "tier min_txn_count values must be strictly ascending",
                ));
            }
        }
        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.persona) {
                return Err(ConfigError::invalid(format!(
                    "persona {} appears in more than one tier",
                    tier.persona
                )));
            }
            if tier.multiplier < Decimal::ZERO {
                return Err(ConfigError::invalid(format!(
                    "multiplier for {} must be non-negative",
                    tier.persona
                )));
            }
        }
        for persona in [Persona::New, Persona::Returning, Persona::Power] {
            if !seen.contains(&persona) {
                return Err(ConfigError::invalid(format!(
                    "persona {persona} has no tier"
                )));
            }
        }
        if self.cache.persona_ttl == 0
            || self.cache.cac_ttl == 0
            || self.cache.idempotency_ttl == 0
        {
            return Err(ConfigError::invalid("cache TTLs must be positive"));
        }
        if self.store.op_timeout_ms == 0 {
            return Err(ConfigError::invalid("store.op_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Look up the tier of a persona
    ///
    /// Returns `None` only for snapshots that bypassed [`Self::validate`],
    /// which guarantees one tier per persona.
    pub fn tier(&self, persona: Persona) -> Option<&PersonaTier> {
        self.tiers.iter().find(|t| t.persona == persona)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) fn valid_config() -> PolicyConfig {
        PolicyConfig {
            policy_version: "v1".to_string(),
            feature_flags: FeatureFlags::default(),
            xp_per_rupee: Decimal::ONE,
            max_xp_per_txn: 500,
            max_cashback_percentage: Decimal::new(10, 2),
            gold_reward_value: 50,
            max_txn_amount: Decimal::new(1_000_000, 0),
            tiers: vec![
                PersonaTier {
                    persona: Persona::New,
                    min_txn_count: 0,
                    multiplier: Decimal::new(15, 1),
                    daily_limit: 200,
                },
                PersonaTier {
                    persona: Persona::Returning,
                    min_txn_count: 3,
                    multiplier: Decimal::new(12, 1),
                    daily_limit: 150,
                },
                PersonaTier {
                    persona: Persona::Power,
                    min_txn_count: 10,
                    multiplier: Decimal::ONE,
                    daily_limit: 100,
                },
            ],
            cache: CacheTtls::default(),
            store: StoreSettings::default(),
            persona_overrides: OverrideSettings::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_tier_lookup() {
        let config = valid_config();
        assert_eq!(config.tier(Persona::Power).unwrap().daily_limit, 100);
        assert_eq!(config.tier(Persona::New).unwrap().min_txn_count, 0);
    }

    #[rstest]
    #[case::empty_version(|c: &mut PolicyConfig| c.policy_version = "  ".to_string())]
    #[case::negative_xp_rate(|c: &mut PolicyConfig| c.xp_per_rupee = Decimal::new(-1, 0))]
    #[case::percentage_above_one(|c: &mut PolicyConfig| {
        c.max_cashback_percentage = Decimal::new(15, 1)
    })]
    #[case::negative_percentage(|c: &mut PolicyConfig| {
        c.max_cashback_percentage = Decimal::new(-10, 2)
    })]
    #[case::zero_max_amount(|c: &mut PolicyConfig| c.max_txn_amount = Decimal::ZERO)]
    #[case::no_tiers(|c: &mut PolicyConfig| c.tiers.clear())]
    #[case::first_tier_not_zero(|c: &mut PolicyConfig| c.tiers[0].min_txn_count = 1)]
    #[case::unordered_tiers(|c: &mut PolicyConfig| c.tiers[2].min_txn_count = 2)]
    #[case::duplicate_persona(|c: &mut PolicyConfig| c.tiers[2].persona = Persona::New)]
    #[case::missing_persona(|c: &mut PolicyConfig| { c.tiers.pop(); })]
    #[case::negative_multiplier(|c: &mut PolicyConfig| {
        c.tiers[1].multiplier = Decimal::new(-1, 0)
    })]
    #[case::zero_ttl(|c: &mut PolicyConfig| c.cache.idempotency_ttl = 0)]
    #[case::zero_timeout(|c: &mut PolicyConfig| c.store.op_timeout_ms = 0)]
    fn test_invalid_config_rejected(#[case] corrupt: fn(&mut PolicyConfig)) {
        let mut config = valid_config();
        corrupt(&mut config);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_yaml_defaults_applied() {
        let yaml = r#"
policy_version: v2
xp_per_rupee: 1
max_xp_per_txn: 500
max_cashback_percentage: 0.10
tiers:
  - persona: NEW
    min_txn_count: 0
    multiplier: 1.5
    daily_limit: 200
  - persona: RETURNING
    min_txn_count: 3
    multiplier: 1.2
    daily_limit: 150
  - persona: POWER
    min_txn_count: 10
    multiplier: 1.0
    daily_limit: 100
"#;
        let config: PolicyConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.gold_reward_value, 50);
        assert_eq!(config.cache.persona_ttl, 2_592_000);
        assert_eq!(config.store.op_timeout_ms, 5_000);
        assert!(!config.feature_flags.prefer_xp);
        assert!(!config.persona_overrides.enabled);
    }

    #[test]
    fn test_yaml_override_section_parsed() {
        let yaml = r#"
policy_version: v1
xp_per_rupee: 1
max_xp_per_txn: 500
max_cashback_percentage: 0.10
tiers:
  - { persona: NEW, min_txn_count: 0, multiplier: 1.5, daily_limit: 200 }
  - { persona: RETURNING, min_txn_count: 3, multiplier: 1.2, daily_limit: 150 }
  - { persona: POWER, min_txn_count: 10, multiplier: 1.0, daily_limit: 100 }
persona_overrides:
  enabled: true
  static_map:
    u-vip: POWER
"#;
        let config: PolicyConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.persona_overrides.enabled);
        assert_eq!(
            config.persona_overrides.static_map.get("u-vip"),
            Some(&Persona::Power)
        );
    }
}
