//! Typed, failure-tolerant cache facade.
//!
//! Every backend error or timeout is logged and turned into "absent" or a
//! no-op, so the resolver behaves the same with the cache offline, only slower.

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::backend::CacheBackend;
use crate::cache::codec::{self, Entry, NEGATIVE_MARKER};
use crate::cache::{CacheError, CacheResult};
use crate::config::CacheConfig;
use crate::observability::metrics::{MetricsSink, NoopSink};
use crate::resilience::timeouts::with_deadline;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// A cached value.
    Hit(T),
    /// The key is cached as confirmed absent.
    Negative,
    /// Nothing usable is cached (never written, expired, or the cache failed).
    Miss,
}

/// Reachability of the cache, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHealth {
    Up,
    Down,
    Disabled,
}

impl CacheHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheHealth::Up => "up",
            CacheHealth::Down => "down",
            CacheHealth::Disabled => "disabled",
        }
    }
}

/// Tunables for the cache facade.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Deadline for a single backend call.
    pub operation_timeout: Duration,
    /// Fraction of the TTL used as random spread on positive writes.
    pub jitter_ratio: f64,
    /// Keys requested per scan page during pattern deletes.
    pub scan_batch_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_millis(250),
            jitter_ratio: 0.1,
            scan_batch_size: 100,
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            operation_timeout: Duration::from_millis(config.operation_timeout_ms),
            jitter_ratio: config.jitter_ratio,
            scan_batch_size: config.scan_batch_size,
        }
    }
}

/// Cache facade shared by the resolver and the invalidation hooks.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    settings: CacheSettings,
    metrics: Arc<dyn MetricsSink>,
}

impl CacheStore {
    /// Create a cache over the given backend.
    pub fn new(backend: Arc<dyn CacheBackend>, settings: CacheSettings) -> Self {
        Self {
            backend: Some(backend),
            settings,
            metrics: Arc::new(NoopSink),
        }
    }

    /// A cache that stores nothing and never logs. Used when caching is
    /// turned off in configuration.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            settings: CacheSettings::default(),
            metrics: Arc::new(NoopSink),
        }
    }

    /// Attach a metrics sink for cache error counts.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Read and decode a key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let Some(backend) = &self.backend else {
            return CacheLookup::Miss;
        };

        let raw = match self.deadline(backend.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                self.report("get", key, &e);
                return CacheLookup::Miss;
            }
        };

        match codec::decode_entry::<T>(&raw) {
            Ok(Entry::Value(value)) => CacheLookup::Hit(value),
            Ok(Entry::Negative) => CacheLookup::Negative,
            Err(e) => {
                self.report("decode", key, &e);
                CacheLookup::Miss
            }
        }
    }

    /// Store a value. The TTL is spread by up to `jitter_ratio` either way
    /// so entries written together do not expire together.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = &self.backend else {
            return;
        };

        let raw = match codec::encode_entry(&value) {
            Ok(raw) => raw,
            Err(e) => {
                self.report("encode", key, &e);
                return;
            }
        };

        let ttl = jittered_ttl(ttl, self.settings.jitter_ratio);
        if let Err(e) = self.deadline(backend.set_ex(key, raw, ttl)).await {
            self.report("set", key, &e);
        }
    }

    /// Cache `key` as confirmed absent for `ttl`. No jitter is applied so the
    /// negative TTL stays strictly below the positive one.
    pub async fn set_negative(&self, key: &str, ttl: Duration) {
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(e) = self
            .deadline(backend.set_ex(key, NEGATIVE_MARKER.to_string(), ttl))
            .await
        {
            self.report("set_negative", key, &e);
        }
    }

    /// Delete one key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        match self.deadline(backend.delete(key)).await {
            Ok(existed) => existed,
            Err(e) => {
                self.report("delete", key, &e);
                false
            }
        }
    }

    /// Delete every key matching a glob pattern. Zero matches is a no-op.
    /// Returns how many keys were removed.
    pub async fn delete_by_pattern(&self, pattern: &str) -> usize {
        let Some(backend) = &self.backend else {
            return 0;
        };
        match self.try_delete_by_pattern(backend.as_ref(), pattern).await {
            Ok(removed) => removed,
            Err(e) => {
                self.report("delete_by_pattern", pattern, &e);
                0
            }
        }
    }

    async fn try_delete_by_pattern(
        &self,
        backend: &dyn CacheBackend,
        pattern: &str,
    ) -> CacheResult<usize> {
        // Collect first so batch deletes never race the scan.
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .deadline(backend.scan(pattern, cursor.as_deref(), self.settings.scan_batch_size))
                .await?;
            keys.extend(page.keys);
            cursor = page.cursor;
            if cursor.is_none() {
                break;
            }
        }

        let mut removed = 0;
        for batch in keys.chunks(self.settings.scan_batch_size.max(1)) {
            removed += self.deadline(backend.delete_many(batch)).await?;
        }

        tracing::debug!(pattern, matched = keys.len(), removed, "Deleted cache keys by pattern");
        Ok(removed)
    }

    /// Check whether the backend answers.
    pub async fn health(&self) -> CacheHealth {
        let Some(backend) = &self.backend else {
            return CacheHealth::Disabled;
        };
        match self.deadline(backend.ping()).await {
            Ok(()) => CacheHealth::Up,
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "Cache ping failed");
                CacheHealth::Down
            }
        }
    }

    async fn deadline<T>(
        &self,
        fut: impl std::future::Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        with_deadline(self.settings.operation_timeout, fut, CacheError::Timeout).await
    }

    fn report(&self, operation: &'static str, key: &str, error: &CacheError) {
        tracing::warn!(operation, key, error = %error, "Cache operation failed, continuing without cache");
        self.metrics.record_cache_error(operation);
    }
}

/// Spread `base` by a uniformly random offset of up to `ratio * base`.
pub fn jittered_ttl(base: Duration, ratio: f64) -> Duration {
    let base_ms = base.as_millis().min(i64::MAX as u128) as i64;
    let spread = (base_ms as f64 * ratio.clamp(0.0, 1.0)) as i64;
    if spread == 0 {
        return base;
    }
    let offset = rand::thread_rng().gen_range(-spread..=spread);
    Duration::from_millis(base_ms.saturating_add(offset).max(1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::{MemoryBackend, ScanPage};
    use crate::cache::codec::Blob;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> CacheResult<bool> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn delete_many(&self, _keys: &[String]) -> CacheResult<usize> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn scan(&self, _pattern: &str, _cursor: Option<&str>, _count: usize) -> CacheResult<ScanPage> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn ping(&self) -> CacheResult<()> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl CacheBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some("1".into()))
        }
        async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
            Ok(())
        }
        async fn delete(&self, _key: &str) -> CacheResult<bool> {
            Ok(false)
        }
        async fn delete_many(&self, _keys: &[String]) -> CacheResult<usize> {
            Ok(0)
        }
        async fn scan(&self, _pattern: &str, _cursor: Option<&str>, _count: usize) -> CacheResult<ScanPage> {
            Ok(ScanPage::default())
        }
        async fn ping(&self) -> CacheResult<()> {
            Ok(())
        }
    }

    fn memory_store() -> (CacheStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = CacheStore::new(Arc::new(backend.clone()), CacheSettings::default());
        (store, backend)
    }

    #[tokio::test]
    async fn test_hit_negative_and_miss_are_distinct() {
        let (cache, _) = memory_store();
        cache.set("k:hit", &vec![1, 2, 3], Duration::from_secs(60)).await;
        cache.set_negative("k:neg", Duration::from_secs(60)).await;

        assert_eq!(cache.get::<Vec<i32>>("k:hit").await, CacheLookup::Hit(vec![1, 2, 3]));
        assert_eq!(cache.get::<Vec<i32>>("k:neg").await, CacheLookup::Negative);
        assert_eq!(cache.get::<Vec<i32>>("k:none").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_non_finite_payload_round_trips() {
        let (cache, _) = memory_store();
        let mut map = BTreeMap::new();
        map.insert("inf".to_string(), Blob::Float(f64::INFINITY));
        map.insert("neg".to_string(), Blob::Float(f64::NEG_INFINITY));
        map.insert("nan".to_string(), Blob::Float(f64::NAN));
        cache.set("k", &Blob::Object(map), Duration::from_secs(60)).await;

        let CacheLookup::Hit(blob) = cache.get::<Blob>("k").await else {
            panic!("expected hit");
        };
        let bits = |k: &str| blob.get(k).and_then(Blob::as_f64).map(f64::to_bits);
        assert_eq!(bits("inf"), Some(f64::INFINITY.to_bits()));
        assert_eq!(bits("neg"), Some(f64::NEG_INFINITY.to_bits()));
        assert_eq!(bits("nan"), Some(f64::NAN.to_bits()));
    }

    #[tokio::test]
    async fn test_positive_ttl_is_jittered_within_ten_percent() {
        let (cache, backend) = memory_store();
        for i in 0..20 {
            let key = format!("k{i}");
            cache.set(&key, &i, Duration::from_secs(1000)).await;
            let ttl = backend.ttl(&key).unwrap();
            assert!(ttl <= Duration::from_secs(1100), "ttl too long: {ttl:?}");
            assert!(ttl >= Duration::from_secs(899), "ttl too short: {ttl:?}");
        }
    }

    #[tokio::test]
    async fn test_negative_ttl_is_exact() {
        let (cache, backend) = memory_store();
        cache.set_negative("k", Duration::from_secs(60)).await;
        let ttl = backend.ttl("k").unwrap();
        assert!(ttl <= Duration::from_secs(60));
        assert!(ttl > Duration::from_secs(59));
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss() {
        let (cache, backend) = memory_store();
        backend.set_ex("k", "{oops".into(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<Blob>("k").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_delete_by_pattern() {
        let (cache, backend) = memory_store();
        for lang in ["en-us", "ja-jp", "zh-cn"] {
            cache.set(&format!("config:example.com:lang:{lang}"), &1, Duration::from_secs(60)).await;
        }
        cache.set("config:other.com:lang:en-us", &1, Duration::from_secs(60)).await;

        assert_eq!(cache.delete_by_pattern("config:example.com:lang:*").await, 3);
        assert_eq!(backend.len(), 1);
        assert_eq!(cache.delete_by_pattern("config:example.com:lang:*").await, 0);
    }

    #[tokio::test]
    async fn test_delete_by_pattern_spans_pages() {
        let backend = MemoryBackend::new();
        let settings = CacheSettings {
            scan_batch_size: 2,
            ..CacheSettings::default()
        };
        let cache = CacheStore::new(Arc::new(backend.clone()), settings);
        for i in 0..9 {
            cache.set(&format!("config:d:lang:l{i}"), &i, Duration::from_secs(60)).await;
        }
        assert_eq!(cache.delete_by_pattern("config:d:lang:*").await, 9);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let cache = CacheStore::new(Arc::new(BrokenBackend), CacheSettings::default());
        cache.set("k", &1, Duration::from_secs(60)).await;
        cache.set_negative("k", Duration::from_secs(60)).await;
        assert_eq!(cache.get::<i32>("k").await, CacheLookup::Miss);
        assert!(!cache.delete("k").await);
        assert_eq!(cache.delete_by_pattern("k*").await, 0);
        assert_eq!(cache.health().await, CacheHealth::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out_as_miss() {
        let cache = CacheStore::new(Arc::new(SlowBackend), CacheSettings::default());
        assert_eq!(cache.get::<i32>("k").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = CacheStore::disabled();
        assert!(!cache.is_enabled());
        cache.set("k", &1, Duration::from_secs(60)).await;
        assert_eq!(cache.get::<i32>("k").await, CacheLookup::Miss);
        assert_eq!(cache.health().await, CacheHealth::Disabled);
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_secs(3600);
        for _ in 0..200 {
            let ttl = jittered_ttl(base, 0.1);
            assert!(ttl >= Duration::from_secs(3240) && ttl <= Duration::from_secs(3960));
        }
        assert_eq!(jittered_ttl(base, 0.0), base);
        assert_eq!(jittered_ttl(Duration::from_millis(5), 0.1), Duration::from_millis(5));
    }
}
