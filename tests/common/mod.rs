//! Shared doubles and fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use domain_config::cache::{
    CacheBackend, CacheError, CacheResult, CacheSettings, CacheStore, MemoryBackend, ScanPage,
};
use domain_config::config::ServiceConfig;
use domain_config::http::{AppState, HttpServer};
use domain_config::lifecycle::Shutdown;
use domain_config::resolver::{ConfigResolver, ResolverSettings};
use domain_config::store::{Config, ConfigStore, Domain, MemoryStore, StoreError, StoreResult, Translation};

/// Seed for the four-tier scenario: `www.example.com` → config 1 with only
/// an `en-us` translation; `example.com` has no row.
pub const SCENARIO_SEED: &str = r#"
    [[domains]]
    name = "www.example.com"
    config_id = 1

    [[configs]]
    id = 1
    title = "Example"
    author = "ops"
    keywords = ["example"]
    links = { home = "https://www.example.com" }
    permissions = { max_upload = inf, ratio = nan, floor = -inf }

    [[translations]]
    config_id = 1
    language = "en-US"
    title = "Example (English)"
    author = "ops"
"#;

pub fn scenario_store() -> MemoryStore {
    MemoryStore::from_toml(SCENARIO_SEED).unwrap()
}

pub fn config(id: i64, title: &str) -> Config {
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

pub fn translation(config_id: i64, language: &str, title: &str) -> Translation {
    Translation {
        config_id,
        language: language.to_string(),
        title: title.to_string(),
        author: "ops".to_string(),
        description: String::new(),
        keywords: vec![],
    }
}

pub fn domain(name: &str, config_id: i64) -> Domain {
    Domain {
        name: name.to_string(),
        config_id,
        is_active: true,
    }
}

/// Counts every call before delegating to the wrapped store.
#[derive(Clone)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn find_domain(&self, name: &str) -> StoreResult<Option<Domain>> {
        self.hit();
        self.inner.find_domain(name).await
    }

    async fn find_config(&self, id: i64) -> StoreResult<Option<Config>> {
        self.hit();
        self.inner.find_config(id).await
    }

    async fn find_translation(&self, config_id: i64, language: &str) -> StoreResult<Option<Translation>> {
        self.hit();
        self.inner.find_translation(config_id, language).await
    }

    async fn domains_for_config(&self, config_id: i64) -> StoreResult<Vec<String>> {
        self.hit();
        self.inner.domains_for_config(config_id).await
    }
}

/// A store that is always down.
pub struct FailingStore;

#[async_trait]
impl ConfigStore for FailingStore {
    async fn find_domain(&self, _name: &str) -> StoreResult<Option<Domain>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_config(&self, _id: i64) -> StoreResult<Option<Config>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_translation(&self, _config_id: i64, _language: &str) -> StoreResult<Option<Translation>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn domains_for_config(&self, _config_id: i64) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// A store that never answers within any reasonable deadline.
pub struct HangingStore;

#[async_trait]
impl ConfigStore for HangingStore {
    async fn find_domain(&self, _name: &str) -> StoreResult<Option<Domain>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn find_config(&self, _id: i64) -> StoreResult<Option<Config>> {
        Ok(None)
    }

    async fn find_translation(&self, _config_id: i64, _language: &str) -> StoreResult<Option<Translation>> {
        Ok(None)
    }

    async fn domains_for_config(&self, _config_id: i64) -> StoreResult<Vec<String>> {
        Ok(vec![])
    }
}

/// A cache backend where every call fails.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("cache offline".into()))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Backend("cache offline".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Backend("cache offline".into()))
    }

    async fn delete_many(&self, _keys: &[String]) -> CacheResult<usize> {
        Err(CacheError::Backend("cache offline".into()))
    }

    async fn scan(&self, _pattern: &str, _cursor: Option<&str>, _count: usize) -> CacheResult<ScanPage> {
        Err(CacheError::Backend("cache offline".into()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Backend("cache offline".into()))
    }
}

pub fn memory_cache() -> (CacheStore, MemoryBackend) {
    let backend = MemoryBackend::new();
    let cache = CacheStore::new(Arc::new(backend.clone()), CacheSettings::default());
    (cache, backend)
}

pub fn failing_cache() -> CacheStore {
    CacheStore::new(Arc::new(FailingCache), CacheSettings::default())
}

pub fn resolver_with(cache: CacheStore, store: Arc<dyn ConfigStore>) -> ConfigResolver {
    ConfigResolver::new(cache, store, ResolverSettings::default())
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `resolver` with `config` on `127.0.0.1:0`.
pub async fn spawn_server(resolver: ConfigResolver, config: ServiceConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(AppState::new(resolver, &config), &config);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
