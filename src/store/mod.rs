//! Backing store interface.
//!
//! The resolver reads three collections through `ConfigStore`: domains,
//! configs (default-language content) and translations. Writes happen
//! elsewhere; this crate only reads and invalidates.
//!
//! # Error Semantics
//! - `Ok(None)` means the row does not exist
//! - `Err(StoreError)` means the store could not answer, and is never
//!   confused with absence

pub mod memory;
pub mod models;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{Config, Domain, Translation};

/// Store failures. All of them surface to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query timed out after {0:?}")]
    Timeout(Duration),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to domains, configs and translations.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Look up a domain by canonical name. Inactive rows are returned as
    /// they are; the resolver skips them.
    async fn find_domain(&self, name: &str) -> StoreResult<Option<Domain>>;

    async fn find_config(&self, id: i64) -> StoreResult<Option<Config>>;

    /// Look up a translation by config and normalized language code.
    async fn find_translation(&self, config_id: i64, language: &str) -> StoreResult<Option<Translation>>;

    /// Names of every domain referencing a config, active or not.
    async fn domains_for_config(&self, config_id: i64) -> StoreResult<Vec<String>>;

    /// Connectivity check for health reporting.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
