//! Core data types for the reward decision engine
//!
//! - `transaction` - Input transaction document and validation
//! - `decision` - Reward decision output and its enums
//! - `error` - Error taxonomy

pub mod decision;
pub mod error;
pub mod transaction;

pub use decision::{DecisionMeta, Persona, ReasonCode, RewardDecision, RewardType};
pub use error::{ConfigError, EngineError, LedgerError, StoreError, ValidationError};
pub use transaction::{Transaction, TxnType};
