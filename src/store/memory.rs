//! In-process `ConfigStore`.
//!
//! Holds the three collections in concurrent maps. Useful for embedding,
//! for tests, and for running the service from a static seed file.
//!
//! # Seed File
//! ```toml
//! [[domains]]
//! name = "www.example.com"
//! config_id = 1
//!
//! [[configs]]
//! id = 1
//! title = "Example"
//! keywords = ["demo"]
//! links = { home = "https://example.com" }
//!
//! [[translations]]
//! config_id = 1
//! language = "en-US"
//! title = "Example (English)"
//! ```

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::matching::{canonicalize, normalize_language};
use crate::store::models::{Config, Domain, Translation};
use crate::store::{ConfigStore, StoreResult};

/// Failure to load a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedFile {
    domains: Vec<Domain>,
    configs: Vec<Config>,
    translations: Vec<Translation>,
}

/// Concurrent in-memory store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    domains: Arc<DashMap<String, Domain>>,
    configs: Arc<DashMap<i64, Config>>,
    translations: Arc<DashMap<(i64, String), Translation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from seed text.
    pub fn from_toml(content: &str) -> Result<Self, SeedError> {
        let seed: SeedFile = toml::from_str(content)?;
        let store = Self::new();
        for config in seed.configs {
            store.upsert_config(config);
        }
        for domain in seed.domains {
            store.upsert_domain(domain);
        }
        for translation in seed.translations {
            store.upsert_translation(translation);
        }
        Ok(store)
    }

    /// Build a store from a seed file on disk.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Insert or replace a domain. The name is canonicalized.
    pub fn upsert_domain(&self, mut domain: Domain) {
        domain.name = canonicalize(&domain.name).clean;
        self.domains.insert(domain.name.clone(), domain);
    }

    pub fn upsert_config(&self, config: Config) {
        self.configs.insert(config.id, config);
    }

    /// Insert or replace a translation. The language code is normalized.
    pub fn upsert_translation(&self, mut translation: Translation) {
        translation.language = normalize_language(&translation.language);
        self.translations
            .insert((translation.config_id, translation.language.clone()), translation);
    }

    pub fn remove_domain(&self, name: &str) -> Option<Domain> {
        self.domains.remove(&canonicalize(name).clean).map(|(_, d)| d)
    }

    /// Remove a config along with its translations.
    pub fn remove_config(&self, id: i64) -> Option<Config> {
        self.translations.retain(|(config_id, _), _| *config_id != id);
        self.configs.remove(&id).map(|(_, c)| c)
    }

    pub fn remove_translation(&self, config_id: i64, language: &str) -> Option<Translation> {
        self.translations
            .remove(&(config_id, normalize_language(language)))
            .map(|(_, t)| t)
    }

    /// Row counts as `(domains, configs, translations)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.domains.len(), self.configs.len(), self.translations.len())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn find_domain(&self, name: &str) -> StoreResult<Option<Domain>> {
        Ok(self.domains.get(name).map(|d| d.value().clone()))
    }

    async fn find_config(&self, id: i64) -> StoreResult<Option<Config>> {
        Ok(self.configs.get(&id).map(|c| c.value().clone()))
    }

    async fn find_translation(&self, config_id: i64, language: &str) -> StoreResult<Option<Translation>> {
        Ok(self
            .translations
            .get(&(config_id, normalize_language(language)))
            .map(|t| t.value().clone()))
    }

    async fn domains_for_config(&self, config_id: i64) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self
            .domains
            .iter()
            .filter(|d| d.config_id == config_id)
            .map(|d| d.key().clone())
            .collect();
        names.sort_unstable();
        Ok(names)
    }
}
