//! Policy configuration: document model and hot-reload store
//!
//! - `policy` - The [`PolicyConfig`] snapshot and its validation
//! - `store` - [`ConfigStore`], the atomically swapped active snapshot

pub mod policy;
pub mod store;

pub use policy::{
    CacheTtls, FeatureFlags, OverrideSettings, PersonaTier, PolicyConfig, StoreSettings,
};
pub use store::ConfigStore;
