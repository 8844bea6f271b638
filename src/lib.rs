//! Reward Decision Engine Library
//! # Overview
//!
//! This library computes reward decisions (XP, cashback, or gold) for
//! payment transactions under a hot-reloadable policy document.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, RewardDecision, errors)
//! - [`config`] - Policy document model and the hot-swapped active snapshot
//! - [`store`] - Key-value store contract, key layout, and the in-memory
//!   implementation
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Decision orchestration and the rule set
//!   - [`core::persona`] - Persona derivation from transaction counters
//!   - [`core::cac`] - Per-user daily cashback ledger
//!   - [`core::idempotency`] - Decision replay cache
//! - [`io`] - JSONL input/output handling
//! - [`cli`] - CLI argument parsing
//!
//! # Decision Flow
//!
//! Each transaction is validated, checked against the replay cache, and then
//! decided against the policy snapshot taken at entry:
//!
//! 1. An exhausted daily cashback limit grants XP.
//! 2. `prefer_gold` grants a flat gold value to POWER users.
//! 3. `prefer_xp` grants XP.
//! 4. Otherwise cashback is granted, capped by the remaining daily headroom,
//!    the transaction's XP value, and the percentage cap.
//!
//! Store failures never fail a request: reads degrade to safe defaults and
//! writes are dropped, with warnings either way.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod store;
pub mod types;

pub use crate::core::DecisionEngine;
pub use config::{ConfigStore, PolicyConfig};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    EngineError, Persona, ReasonCode, RewardDecision, RewardType, Transaction, TxnType,
};
