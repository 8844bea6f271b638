//! Pluggable persona override sources
//!
//! An override source supplies a persona for a user ahead of the pure
//! classifier. An override applies to the current decision only: it never
//! touches the stored transaction counter, so the user's irreversible
//! tier progression continues underneath unchanged.
//!
//! Variants are selected by the `persona_overrides` config section. When
//! both the static map and the JSON file are configured, the static map is
//! consulted first. A remote-lookup source fits behind the same trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::warn;

use crate::config::OverrideSettings;
use crate::types::Persona;

/// A source of per-user persona overrides
#[async_trait]
pub trait PersonaOverride: Send + Sync {
    /// Persona to use for this user, or `None` to keep the derived one
    async fn lookup(&self, user_id: &str) -> Option<Persona>;
}

/// The disabled source; never overrides
#[derive(Debug, Default)]
pub struct NoOverride;

#[async_trait]
impl PersonaOverride for NoOverride {
    async fn lookup(&self, _user_id: &str) -> Option<Persona> {
        None
    }
}

/// Overrides from a fixed map embedded in the policy document
#[derive(Debug)]
pub struct StaticMapOverride {
    map: HashMap<String, Persona>,
}

impl StaticMapOverride {
    /// Build from a user_id -> persona map
    pub fn new(map: HashMap<String, Persona>) -> Self {
        Self { map }
    }
}

#[async_trait]
impl PersonaOverride for StaticMapOverride {
    async fn lookup(&self, user_id: &str) -> Option<Persona> {
        self.map.get(user_id).copied()
    }
}

/// Overrides from a JSON file of user_id -> persona pairs
///
/// The file is read once at construction and on explicit [`Self::reload`].
/// An unreadable or malformed file degrades to an empty table with a
/// warning; entries carrying an unknown persona value are skipped.
#[derive(Debug)]
pub struct FileOverride {
    path: PathBuf,
    entries: RwLock<HashMap<String, Persona>>,
}

impl FileOverride {
    /// Load the override table from `path`
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = RwLock::new(Self::read_table(&path));
        Self { path, entries }
    }

    /// Re-read the backing file, replacing the table wholesale
    pub fn reload(&self) {
        let table = Self::read_table(&self.path);
        match self.entries.write() {
            Ok(mut guard) => *guard = table,
            Err(poisoned) => *poisoned.into_inner() = table,
        }
    }

    fn read_table(path: &Path) -> HashMap<String, Persona> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "persona override file unreadable");
                return HashMap::new();
            }
        };
        let parsed: HashMap<String, String> = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "persona override file malformed");
                return HashMap::new();
            }
        };
        parsed
            .into_iter()
            .filter_map(|(user_id, value)| match value.parse::<Persona>() {
                Ok(persona) => Some((user_id, persona)),
                Err(()) => {
                    warn!(user_id = %user_id, value = %value, "skipping unknown persona in override file");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl PersonaOverride for FileOverride {
    async fn lookup(&self, user_id: &str) -> Option<Persona> {
        match self.entries.read() {
            Ok(guard) => guard.get(user_id).copied(),
            Err(poisoned) => poisoned.into_inner().get(user_id).copied(),
        }
    }
}

/// Consults sources in order; the first hit wins
pub struct ChainOverride {
    sources: Vec<Box<dyn PersonaOverride>>,
}

#[async_trait]
impl PersonaOverride for ChainOverride {
    async fn lookup(&self, user_id: &str) -> Option<Persona> {
        for source in &self.sources {
            if let Some(persona) = source.lookup(user_id).await {
                return Some(persona);
            }
        }
        None
    }
}

/// Build the override source selected by configuration
///
/// Disabled settings yield [`NoOverride`]. Otherwise the static map takes
/// priority over the JSON file.
pub fn from_settings(settings: &OverrideSettings) -> Arc<dyn PersonaOverride> {
    if !settings.enabled {
        return Arc::new(NoOverride);
    }

    let mut sources: Vec<Box<dyn PersonaOverride>> = Vec::new();
    if !settings.static_map.is_empty() {
        sources.push(Box::new(StaticMapOverride::new(settings.static_map.clone())));
    }
    if let Some(path) = &settings.json_file_path {
        sources.push(Box::new(FileOverride::load(path)));
    }

    match sources.len() {
        0 => Arc::new(NoOverride),
        _ => Arc::new(ChainOverride { sources }),
    }
}
