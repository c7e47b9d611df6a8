//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Start background tasks (cache purge, metrics)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::cache::{CacheSettings, CacheStore, MemoryBackend};
use crate::config::ServiceConfig;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{init_metrics, MetricsSink, NoopSink, PrometheusSink};
use crate::resolver::{ConfigResolver, ResolverSettings};
use crate::store::memory::SeedError;
use crate::store::MemoryStore;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load seed data: {0}")]
    Seed(#[from] SeedError),

    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the HTTP layer needs, plus handles for background work.
pub struct Services {
    pub state: AppState,
    pub store: MemoryStore,
    /// Present when caching is enabled.
    pub cache_backend: Option<MemoryBackend>,
}

/// Build store, cache and resolver from configuration.
pub fn build_services(config: &ServiceConfig) -> Result<Services, StartupError> {
    let store = match &config.store.seed_path {
        Some(path) => MemoryStore::load(Path::new(path))?,
        None => MemoryStore::new(),
    };
    let (domains, configs, translations) = store.counts();
    tracing::info!(domains, configs, translations, "Store ready");

    let metrics: Arc<dyn MetricsSink> = if config.observability.metrics_enabled {
        Arc::new(PrometheusSink)
    } else {
        Arc::new(NoopSink)
    };

    let (cache, cache_backend) = if config.cache.enabled {
        let backend = MemoryBackend::new();
        let cache = CacheStore::new(Arc::new(backend.clone()), CacheSettings::from(&config.cache))
            .with_metrics(metrics.clone());
        (cache, Some(backend))
    } else {
        tracing::info!("Cache disabled, every lookup goes to the store");
        (CacheStore::disabled(), None)
    };

    let resolver = ConfigResolver::new(cache, Arc::new(store.clone()), ResolverSettings::from(config))
        .with_metrics(metrics);

    Ok(Services {
        state: AppState::new(resolver, config),
        store,
        cache_backend,
    })
}

fn parse_addr(address: &str) -> Result<SocketAddr, StartupError> {
    address.parse().map_err(|source| StartupError::Address {
        address: address.to_string(),
        source,
    })
}

/// Start the service and block until shutdown.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let services = build_services(&config)?;
    let purge = services
        .cache_backend
        .as_ref()
        .map(|backend| backend.start_purge_task(PURGE_INTERVAL));

    let listener = TcpListener::bind(parse_addr(&config.listener.bind_address)?).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        default_language = %services.state.resolver.default_language(),
        cache_enabled = services.cache_backend.is_some(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let signals = shutdown.listen_for_signals();

    let server = HttpServer::new(services.state, &config);
    server.run(listener, shutdown.subscribe()).await?;

    signals.abort();
    if let Some(purge) = purge {
        purge.abort();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
