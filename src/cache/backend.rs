//! Cache backends.
//!
//! `CacheBackend` is the raw string key-value surface the cache layer needs
//! from an external cache (expiring writes, deletes, cursor scans).
//! `MemoryBackend` is the bundled implementation.
//!
//! Scans resume after the last key returned rather than at an offset, so a
//! key that stays live for the whole scan is returned exactly once even when
//! other keys expire or are deleted between pages.

use async_trait::async_trait;
use dashmap::DashMap;
use glob::Pattern;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::{CacheError, CacheResult};

/// One page of a cursor scan. A `cursor` of `None` means the scan is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Opaque resume token for the next call.
    pub cursor: Option<String>,
    pub keys: Vec<String>,
}

/// Raw key-value operations against an external cache.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Returns true if the key existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Returns the number of keys that existed.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<usize>;

    /// Incremental scan over keys matching a glob pattern. Start with no
    /// cursor and pass back each returned one until it comes back `None`.
    async fn scan(&self, pattern: &str, cursor: Option<&str>, count: usize) -> CacheResult<ScanPage>;

    async fn ping(&self) -> CacheResult<()>;
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

/// In-process cache backend with per-key expiry.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining time to live of a key, if it is live.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now)
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| v.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Purge expired keys on a fixed interval until the handle is aborted.
    pub fn start_purge_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let purged = backend.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = backend.len(), "Purged expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, v| v.expires_at <= now);
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key.to_string(), StoredValue { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<usize> {
        Ok(keys.iter().filter(|k| self.entries.remove(k.as_str()).is_some()).count())
    }

    async fn scan(&self, pattern: &str, cursor: Option<&str>, count: usize) -> CacheResult<ScanPage> {
        let matcher = Pattern::new(pattern).map_err(|e| CacheError::Pattern(e.to_string()))?;
        let now = Instant::now();

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().expires_at > now && matcher.matches(e.key()))
            .filter(|e| cursor.map_or(true, |after| e.key().as_str() > after))
            .map(|e| e.key().clone())
            .collect();
        keys.sort_unstable();

        let count = count.max(1);
        let cursor = if keys.len() > count {
            keys.truncate(count);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ScanPage { cursor, keys })
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
