//! The fallback search.
//!
//! For each candidate, in order:
//! - cache hit: return it
//! - negative cache hit: skip to the next candidate, no store access
//! - miss: query the store, cache the answer (positive or negative)
//!
//! Candidates are tried sequentially; the first hit wins. Cache failures
//! read as misses. Store failures abort the resolution.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::{keys, CacheLookup, CacheStore};
use crate::config::ServiceConfig;
use crate::matching::{canonicalize, normalize_language, CanonicalDomain};
use crate::observability::metrics::{CacheOutcome, MetricsSink, NoopSink, StoreOutcome};
use crate::resilience::timeouts::with_deadline;
use crate::resolver::candidates::{default_plan, language_plan, Candidate};
use crate::resolver::types::{ConfigPayload, QueryMode, Resolution, ResolutionResult};
use crate::store::{ConfigStore, StoreError, StoreResult};

/// Resolver tunables.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Base TTL for positive entries.
    pub ttl: Duration,
    /// TTL for negative entries.
    pub negative_ttl: Duration,
    /// Normalized default language.
    pub default_language: String,
    /// Deadline for one store query.
    pub store_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            negative_ttl: Duration::from_secs(60),
            default_language: "zh-cn".to_string(),
            store_timeout: Duration::from_secs(2),
        }
    }
}

impl From<&ServiceConfig> for ResolverSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            ttl: config.cache.ttl(),
            negative_ttl: config.cache.negative_ttl(),
            default_language: normalize_language(&config.languages.default),
            store_timeout: Duration::from_millis(config.store.query_timeout_ms),
        }
    }
}

/// Resolves `(domain, language)` requests to config payloads.
#[derive(Clone)]
pub struct ConfigResolver {
    cache: CacheStore,
    store: Arc<dyn ConfigStore>,
    metrics: Arc<dyn MetricsSink>,
    settings: ResolverSettings,
}

impl ConfigResolver {
    pub fn new(cache: CacheStore, store: Arc<dyn ConfigStore>, mut settings: ResolverSettings) -> Self {
        settings.default_language = normalize_language(&settings.default_language);
        Self {
            cache,
            store,
            metrics: Arc::new(NoopSink),
            settings,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn default_language(&self) -> &str {
        &self.settings.default_language
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Language-aware lookup. A missing language means the default.
    pub async fn resolve_language(
        &self,
        domain: &str,
        language: Option<&str>,
    ) -> Result<Resolution, StoreError> {
        self.resolve(domain, language, QueryMode::Language).await
    }

    /// Language-agnostic lookup of a domain's default config.
    pub async fn resolve_default(&self, domain: &str) -> Result<Resolution, StoreError> {
        self.resolve(domain, None, QueryMode::Default).await
    }

    /// Run the fallback search for one request.
    pub async fn resolve(
        &self,
        domain_input: &str,
        requested_language: Option<&str>,
        mode: QueryMode,
    ) -> Result<Resolution, StoreError> {
        let domain = canonicalize(domain_input);
        let requested = match mode {
            QueryMode::Language => Some(
                requested_language
                    .map(normalize_language)
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| self.settings.default_language.clone()),
            ),
            QueryMode::Default => None,
        };

        if domain.is_empty() {
            tracing::debug!(input = domain_input, "Domain canonicalized to nothing");
            self.metrics.record_resolution(mode.as_str(), "not_found", None);
            return Ok(Resolution::NotFound {
                domain: domain.clean,
                language: requested,
            });
        }

        let plan = match &requested {
            Some(language) => language_plan(&domain, language, &self.settings.default_language),
            None => default_plan(&domain),
        };

        for candidate in &plan {
            let payload = match self.lookup(candidate).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(
                        domain = %domain,
                        candidate = %candidate.cache_key(),
                        error = %e,
                        "Resolution aborted by store failure"
                    );
                    self.metrics.record_resolution(mode.as_str(), "error", Some(candidate.tier));
                    return Err(e);
                }
            };

            if let Some(data) = payload {
                self.metrics.record_resolution(mode.as_str(), "found", Some(candidate.tier));
                return Ok(Resolution::Found(build_result(&domain, requested, candidate, data)));
            }
        }

        tracing::debug!(domain = %domain, language = ?requested, "No candidate matched");
        self.metrics.record_resolution(mode.as_str(), "not_found", None);
        Ok(Resolution::NotFound {
            domain: domain.clean,
            language: requested,
        })
    }

    /// Cache, then store, for one candidate.
    async fn lookup(&self, candidate: &Candidate) -> StoreResult<Option<ConfigPayload>> {
        let key = candidate.cache_key();

        match self.cache.get::<ConfigPayload>(&key).await {
            CacheLookup::Hit(payload) => {
                self.metrics.record_cache_lookup(CacheOutcome::Hit);
                tracing::debug!(key = %key, tier = candidate.tier, "Cache hit");
                return Ok(Some(payload));
            }
            CacheLookup::Negative => {
                self.metrics.record_cache_lookup(CacheOutcome::Negative);
                tracing::debug!(key = %key, tier = candidate.tier, "Negative cache hit");
                return Ok(None);
            }
            CacheLookup::Miss => self.metrics.record_cache_lookup(CacheOutcome::Miss),
        }

        let fetched = self.fetch(candidate).await?;
        match &fetched {
            Some(payload) => self.cache.set(&key, payload, self.settings.ttl).await,
            None => self.cache.set_negative(&key, self.settings.negative_ttl).await,
        }
        tracing::debug!(key = %key, tier = candidate.tier, found = fetched.is_some(), "Store lookup");
        Ok(fetched)
    }

    async fn fetch(&self, candidate: &Candidate) -> StoreResult<Option<ConfigPayload>> {
        let domain = self
            .query("find_domain", self.store.find_domain(&candidate.domain))
            .await?
            .filter(|d| d.is_active);
        let Some(domain) = domain else {
            return Ok(None);
        };

        let Some(language) = &candidate.language else {
            let config = self
                .query("find_config", self.store.find_config(domain.config_id))
                .await?;
            return Ok(config.map(ConfigPayload::from_config));
        };

        let Some(translation) = self
            .query("find_translation", self.store.find_translation(domain.config_id, language))
            .await?
        else {
            return Ok(None);
        };
        let config = self
            .query("find_config", self.store.find_config(domain.config_id))
            .await?;
        Ok(config.map(|config| ConfigPayload::translated(config, translation)))
    }

    /// Run one store query under the store deadline and record it.
    async fn query<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StoreResult<Option<T>>>,
    ) -> StoreResult<Option<T>> {
        let started = Instant::now();
        let result = with_deadline(self.settings.store_timeout, fut, StoreError::Timeout).await;
        let outcome = match &result {
            Ok(Some(_)) => StoreOutcome::Found,
            Ok(None) => StoreOutcome::Absent,
            Err(_) => StoreOutcome::Failed,
        };
        self.metrics.record_store_query(operation, outcome, started.elapsed());
        result
    }

    /// Whether the store answers a ping within the store deadline.
    pub async fn store_reachable(&self) -> bool {
        match with_deadline(self.settings.store_timeout, self.store.ping(), StoreError::Timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store ping failed");
                false
            }
        }
    }

    /// Drop every cached entry for one domain. Returns the number removed.
    pub async fn invalidate_domain(&self, domain_input: &str) -> usize {
        let domain = canonicalize(domain_input);
        if domain.is_empty() {
            return 0;
        }
        let mut removed = usize::from(self.cache.delete(&keys::default_key(&domain.clean)).await);
        removed += self
            .cache
            .delete_by_pattern(&keys::language_pattern(&domain.clean))
            .await;
        tracing::info!(domain = %domain, removed, "Invalidated domain cache");
        removed
    }

    /// Drop cached entries for every domain referencing a config.
    ///
    /// Domains are looked up in the store as it is now. When a domain row is
    /// repointed to another config or deleted, the caller must also call
    /// [`invalidate_domain`](Self::invalidate_domain) with the old name, since
    /// it no longer maps to this config.
    pub async fn invalidate_config(&self, config_id: i64) -> StoreResult<usize> {
        let domains = with_deadline(
            self.settings.store_timeout,
            self.store.domains_for_config(config_id),
            StoreError::Timeout,
        )
        .await?;

        let mut removed = 0;
        for domain in &domains {
            removed += self.invalidate_domain(domain).await;
        }
        tracing::info!(config_id, domains = domains.len(), removed, "Invalidated config cache");
        Ok(removed)
    }

    /// Drop every entry this service writes.
    pub async fn invalidate_all(&self) -> usize {
        let mut removed = 0;
        for pattern in keys::all_patterns() {
            removed += self.cache.delete_by_pattern(&pattern).await;
        }
        tracing::info!(removed, "Invalidated entire cache");
        removed
    }
}

fn build_result(
    domain: &CanonicalDomain,
    requested: Option<String>,
    candidate: &Candidate,
    data: ConfigPayload,
) -> ResolutionResult {
    let (language, is_fallback) = match (&candidate.language, &requested) {
        (Some(served), Some(asked)) => (served.clone(), served != asked),
        _ => ("default".to_string(), false),
    };
    ResolutionResult {
        domain: domain.clean.clone(),
        actual_domain: candidate.domain.clone(),
        language,
        requested_language: requested,
        is_fallback,
        is_domain_fallback: candidate.domain != domain.clean,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheSettings, MemoryBackend};
    use crate::store::{Config, Domain, MemoryStore, Translation};

    fn config(id: i64, title: &str) -> Config {
        Config {
            id,
            title: title.to_string(),
            author: "ops".to_string(),
            description: String::new(),
            keywords: vec![],
            links: Default::default(),
            permissions: Default::default(),
        }
    }

    fn translation(config_id: i64, language: &str, title: &str) -> Translation {
        Translation {
            config_id,
            language: language.to_string(),
            title: title.to_string(),
            author: "ops".to_string(),
            description: String::new(),
            keywords: vec![],
        }
    }

    fn domain(name: &str, config_id: i64) -> Domain {
        Domain {
            name: name.to_string(),
            config_id,
            is_active: true,
        }
    }

    fn resolver(store: MemoryStore) -> (ConfigResolver, MemoryBackend) {
        let backend = MemoryBackend::new();
        let cache = CacheStore::new(Arc::new(backend.clone()), CacheSettings::default());
        let resolver = ConfigResolver::new(cache, Arc::new(store), ResolverSettings::default());
        (resolver, backend)
    }

    #[tokio::test]
    async fn test_exact_hit() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "base"));
        store.upsert_domain(domain("www.example.com", 1));
        store.upsert_translation(translation(1, "en-US", "english"));
        let (resolver, _) = resolver(store);

        let result = resolver
            .resolve_language("https://www.example.com/x", Some("en_US"))
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(result.domain, "www.example.com");
        assert_eq!(result.actual_domain, "www.example.com");
        assert_eq!(result.language, "en-us");
        assert_eq!(result.requested_language.as_deref(), Some("en-us"));
        assert!(!result.is_fallback);
        assert!(!result.is_domain_fallback);
        assert_eq!(result.data.title, "english");
    }

    #[tokio::test]
    async fn test_language_fallback_to_default() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "base"));
        store.upsert_domain(domain("www.example.com", 1));
        store.upsert_translation(translation(1, "zh-CN", "chinese"));
        let (resolver, _) = resolver(store);

        let result = resolver
            .resolve_language("www.example.com", Some("ja-jp"))
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(result.language, "zh-cn");
        assert!(result.is_fallback);
        assert!(!result.is_domain_fallback);
    }

    #[tokio::test]
    async fn test_missing_language_means_default() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "base"));
        store.upsert_domain(domain("example.com", 1));
        store.upsert_translation(translation(1, "zh-CN", "chinese"));
        let (resolver, _) = resolver(store);

        let result = resolver.resolve_language("example.com", None).await.unwrap().found().unwrap();
        assert_eq!(result.language, "zh-cn");
        assert_eq!(result.requested_language.as_deref(), Some("zh-cn"));
        assert!(!result.is_fallback);
    }

    #[tokio::test]
    async fn test_inactive_domain_falls_back_to_root() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "sub"));
        store.upsert_config(config(2, "root"));
        store.upsert_domain(Domain {
            is_active: false,
            ..domain("www.example.com", 1)
        });
        store.upsert_domain(domain("example.com", 2));
        let (resolver, _) = resolver(store);

        let result = resolver.resolve_default("www.example.com").await.unwrap().found().unwrap();
        assert_eq!(result.actual_domain, "example.com");
        assert_eq!(result.language, "default");
        assert_eq!(result.requested_language, None);
        assert!(result.is_domain_fallback);
        assert!(!result.is_fallback);
        assert_eq!(result.data.title, "root");
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "base"));
        store.upsert_domain(domain("example.com", 1));
        let (resolver, backend) = resolver(store.clone());

        assert!(resolver.resolve_default("example.com").await.unwrap().is_found());
        assert!(backend.ttl("domain:config:example.com").is_some());

        // Served from cache even after the row disappears.
        store.remove_domain("example.com");
        assert!(resolver.resolve_default("example.com").await.unwrap().is_found());

        assert_eq!(resolver.invalidate_domain("EXAMPLE.com").await, 1);
        assert!(!resolver.resolve_default("example.com").await.unwrap().is_found());
    }

    #[tokio::test]
    async fn test_negative_entries_written_per_candidate() {
        let (resolver, backend) = resolver(MemoryStore::new());

        let outcome = resolver.resolve_language("www.example.com", Some("en-us")).await.unwrap();
        assert_eq!(
            outcome,
            Resolution::NotFound {
                domain: "www.example.com".into(),
                language: Some("en-us".into()),
            }
        );
        assert_eq!(backend.len(), 4);
        let ttl = backend.ttl("config:example.com:lang:zh-cn").unwrap();
        assert!(ttl <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_empty_domain_touches_nothing() {
        let (resolver, backend) = resolver(MemoryStore::new());
        let outcome = resolver.resolve_language("https:///path", Some("en-us")).await.unwrap();
        assert!(!outcome.is_found());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_config_covers_all_domains() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "base"));
        store.upsert_domain(domain("a.example.com", 1));
        store.upsert_domain(domain("b.example.com", 1));
        store.upsert_translation(translation(1, "en-us", "english"));
        let (resolver, backend) = resolver(store);

        for host in ["a.example.com", "b.example.com"] {
            resolver.resolve_language(host, Some("en-us")).await.unwrap();
            resolver.resolve_default(host).await.unwrap();
        }
        assert_eq!(backend.len(), 4);

        assert_eq!(resolver.invalidate_config(1).await.unwrap(), 4);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_config_misses_repointed_domain() {
        let store = MemoryStore::new();
        store.upsert_config(config(1, "old"));
        store.upsert_config(config(2, "new"));
        store.upsert_domain(domain("example.com", 1));
        let (resolver, backend) = resolver(store.clone());

        resolver.resolve_default("example.com").await.unwrap();
        assert_eq!(backend.len(), 1);

        store.upsert_domain(domain("example.com", 2));
        assert_eq!(resolver.invalidate_config(1).await.unwrap(), 0);
        let stale = resolver.resolve_default("example.com").await.unwrap().found().unwrap();
        assert_eq!(stale.data.title, "old");

        assert_eq!(resolver.invalidate_domain("example.com").await, 1);
        let fresh = resolver.resolve_default("example.com").await.unwrap().found().unwrap();
        assert_eq!(fresh.data.title, "new");
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (resolver, backend) = resolver(MemoryStore::new());
        resolver.resolve_language("www.example.com", Some("en-us")).await.unwrap();
        resolver.resolve_default("www.example.com").await.unwrap();
        assert_eq!(backend.len(), 6);

        assert_eq!(resolver.invalidate_all().await, 6);
        assert!(backend.is_empty());
    }
}
