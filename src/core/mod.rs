//! Decision logic: persona resolution, the daily ledger, replay, rules
//!
//! - `persona` - [`PersonaClassifier`], tier derivation from counters
//! - `overrides` - pluggable [`PersonaOverride`] sources
//! - `cac` - [`CacLedger`], the per-user daily cashback accumulation
//! - `idempotency` - [`IdempotencyCache`], the decision replay cache
//! - `engine` - [`DecisionEngine`], the full request path

pub mod cac;
pub mod engine;
pub mod idempotency;
pub mod overrides;
pub mod persona;

pub use cac::CacLedger;
pub use engine::DecisionEngine;
pub use idempotency::IdempotencyCache;
pub use overrides::{NoOverride, PersonaOverride};
pub use persona::{PersonaClassifier, PersonaResolution};
