//! Reward decision output types
//!
//! A [`RewardDecision`] is the complete, self-contained outcome of one
//! decision request. It is both the API response document and the value
//! cached under the idempotency key, so replays return byte-identical
//! reward fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behavioral tier of a user
///
/// Derived from the user's transaction count through the ordered tier list
/// in the active policy snapshot. Progression is monotonic: the persona is
/// recomputed from an ever-increasing counter, never stored as independent
/// mutable state, so it can never regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Persona {
    /// Fewer transactions than the RETURNING threshold
    New,
    /// Established user
    Returning,
    /// Heavy user; eligible for GOLD when the flag is set
    Power,
}

impl Persona {
    /// Wire-format name of this persona
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::New => "NEW",
            Persona::Returning => "RETURNING",
            Persona::Power => "POWER",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Persona::New),
            "RETURNING" => Ok(Persona::Returning),
            "POWER" => Ok(Persona::Power),
            _ => Err(()),
        }
    }
}

/// Kind of reward granted by a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RewardType {
    /// Experience points; the fallback when cashback is capped out
    Xp,
    /// Rupee cashback, bounded by the daily CAC limit and percentage cap
    Cashback,
    /// Flat gold grant for POWER users when prefer_gold is set
    Gold,
}

/// Why a decision granted what it granted
///
/// Ordered in `reason_codes` in the order the rules fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// The daily cashback cap was already reached
    CacLimitExceeded,
    /// POWER user granted gold under the prefer_gold flag
    GoldGranted,
    /// XP granted under the prefer_xp flag
    XpPreferred,
    /// Cashback granted within the daily limit
    CashbackGranted,
}

/// Per-decision context echoed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMeta {
    /// Persona the decision was computed for (after any override)
    pub persona: Persona,

    /// Cashback already accumulated today, before this decision
    pub daily_cac_used: u64,

    /// Daily cashback limit of the persona's tier
    pub daily_cac_limit: u64,
}

/// The outcome of one decision request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDecision {
    /// Fresh unique identifier, minted once per fresh decision
    ///
    /// Replays within the idempotency TTL return the original value.
    pub decision_id: String,

    /// Version of the policy snapshot the decision was computed against
    pub policy_version: String,

    /// Kind of reward granted
    pub reward_type: RewardType,

    /// Granted value: XP points, cashback rupees, or gold units
    pub reward_value: u64,

    /// XP value of the transaction; always computed, even when not granted
    pub xp: u64,

    /// Rules that fired, in order
    pub reason_codes: Vec<ReasonCode>,

    /// Decision context
    pub meta: DecisionMeta,
}
