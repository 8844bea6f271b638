//! Hot-swappable policy snapshot store
//!
//! `ConfigStore` holds the single active [`PolicyConfig`] snapshot behind an
//! atomically swapped pointer. Readers take the current `Arc` without
//! blocking writers for longer than the pointer swap itself; a reader always
//! sees either the fully old or the fully new snapshot, never a mix.
//!
//! Reload is all-or-nothing: the replacement document is read, parsed, and
//! validated off to the side, and only a fully valid snapshot is swapped in.
//! On any failure the previous snapshot stays active and the failure is
//! reported to the reload caller.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::policy::PolicyConfig;
use crate::types::ConfigError;

/// Read, parse, and validate a policy document
fn read_policy(path: &Path) -> Result<PolicyConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: PolicyConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Holder of the active policy snapshot
pub struct ConfigStore {
    path: PathBuf,
    active: RwLock<Arc<PolicyConfig>>,
}

impl ConfigStore {
    /// Load the policy document at `path` and make it the active snapshot
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document cannot be read, parsed, or
    /// validated. There is no fallback snapshot at startup; a bad initial
    /// document is fatal to the caller.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = read_policy(&path)?;
        info!(version = %config.policy_version, path = %path.display(), "policy loaded");
        Ok(Self {
            path,
            active: RwLock::new(Arc::new(config)),
        })
    }

    /// Build a store from an already-validated snapshot, with no backing file
    ///
    /// Used by tests and embedders that manage the document themselves;
    /// `reload` will fail for lack of a readable source.
    pub fn from_snapshot(config: PolicyConfig) -> Self {
        Self {
            path: PathBuf::new(),
            active: RwLock::new(Arc::new(config)),
        }
    }

    /// Non-blocking read of the active snapshot pointer
    pub fn get_active(&self) -> Arc<PolicyConfig> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a valid snapshot: the only write
            // is a pointer swap, which cannot panic halfway
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the source document and swap it in if fully valid
    ///
    /// Returns the applied version on success. On failure the previously
    /// active snapshot is retained untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] that stopped the reload.
    pub fn reload(&self) -> Result<String, ConfigError> {
        let config = read_policy(&self.path)?;
        let version = config.policy_version.clone();
        let snapshot = Arc::new(config);
        match self.active.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        info!(version = %version, "policy reloaded");
        Ok(version)
    }

    /// Run `reload` on a fixed interval until the handle is dropped/aborted
    ///
    /// Reload failures are logged and do not stop the timer; the active
    /// snapshot simply stays as it was.
    pub fn spawn_reload_timer(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it, we just loaded
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = store.reload() {
                    warn!(error = %e, "policy reload failed, keeping previous snapshot");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const VALID_V1: &str = r#"
policy_version: v1
xp_per_rupee: 1
max_xp_per_txn: 500
max_cashback_percentage: 0.10
tiers:
  - { persona: NEW, min_txn_count: 0, multiplier: 1.5, daily_limit: 200 }
  - { persona: RETURNING, min_txn_count: 3, multiplier: 1.2, daily_limit: 150 }
  - { persona: POWER, min_txn_count: 10, multiplier: 1.0, daily_limit: 100 }
"#;

    const VALID_V2: &str = r#"
policy_version: v2
xp_per_rupee: 2
max_xp_per_txn: 500
max_cashback_percentage: 0.10
tiers:
  - { persona: NEW, min_txn_count: 0, multiplier: 1.5, daily_limit: 200 }
  - { persona: RETURNING, min_txn_count: 3, multiplier: 1.2, daily_limit: 150 }
  - { persona: POWER, min_txn_count: 10, multiplier: 1.0, daily_limit: 100 }
"#;

    // Parses, but fails validation: tiers out of order
    const INVALID_DOC: &str = r#"
policy_version: v3
xp_per_rupee: 1
max_xp_per_txn: 500
max_cashback_percentage: 0.10
tiers:
  - { persona: NEW, min_txn_count: 0, multiplier: 1.5, daily_limit: 200 }
  - { persona: RETURNING, min_txn_count: 9, multiplier: 1.2, daily_limit: 150 }
  - { persona: POWER, min_txn_count: 5, multiplier: 1.0, daily_limit: 100 }
"#;

    fn write_doc(file: &mut NamedTempFile, contents: &str) {
        std::fs::write(file.path(), contents).expect("rewrite policy document");
    }

    #[test]
    fn test_load_valid_document() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, VALID_V1);

        let store = ConfigStore::load(file.path()).unwrap();
        assert_eq!(store.get_active().policy_version, "v1");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ConfigStore::load("/nonexistent/policy.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_malformed_yaml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, "policy_version: [unclosed");

        let result = ConfigStore::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_reload_swaps_valid_document() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, VALID_V1);
        let store = ConfigStore::load(file.path()).unwrap();

        write_doc(&mut file, VALID_V2);
        let applied = store.reload().unwrap();

        assert_eq!(applied, "v2");
        assert_eq!(store.get_active().policy_version, "v2");
        assert_eq!(store.get_active().xp_per_rupee, rust_decimal::Decimal::TWO);
    }

    #[test]
    fn test_reload_invalid_document_retains_prior_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, VALID_V1);
        let store = ConfigStore::load(file.path()).unwrap();

        write_doc(&mut file, INVALID_DOC);
        let result = store.reload();

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        assert_eq!(store.get_active().policy_version, "v1");
    }

    #[test]
    fn test_readers_hold_old_snapshot_across_swap() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, VALID_V1);
        let store = ConfigStore::load(file.path()).unwrap();

        // A reader that took the snapshot before the swap keeps a complete v1
        let before = store.get_active();

        write_doc(&mut file, VALID_V2);
        store.reload().unwrap();

        assert_eq!(before.policy_version, "v1");
        assert_eq!(store.get_active().policy_version, "v2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_timer_applies_new_document() {
        let mut file = NamedTempFile::new().unwrap();
        write_doc(&mut file, VALID_V1);
        let store = Arc::new(ConfigStore::load(file.path()).unwrap());

        write_doc(&mut file, VALID_V2);
        let handle = Arc::clone(&store).spawn_reload_timer(Duration::from_secs(60));

        // Let the timer fire once
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.get_active().policy_version, "v2");
        handle.abort();
    }
}
