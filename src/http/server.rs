//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, CORS)
//! - Bind server to listener
//! - Translate query parameters into resolver calls
//! - Render resolutions and errors as JSON

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{AdminConfig, ServiceConfig};
use crate::http::request::{accept_language, make_span, UuidRequestId};
use crate::http::response::ApiError;
use crate::matching::LanguageNegotiator;
use crate::resolver::{ConfigResolver, QueryMode, Resolution, ResolutionResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: ConfigResolver,
    pub negotiator: Arc<LanguageNegotiator>,
    pub admin: AdminConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(resolver: ConfigResolver, config: &ServiceConfig) -> Self {
        let negotiator = LanguageNegotiator::new(&config.languages.supported, &config.languages.default);
        Self {
            resolver,
            negotiator: Arc::new(negotiator),
            admin: config.admin.clone(),
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the resolution API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over prepared state.
    pub fn new(state: AppState, config: &ServiceConfig) -> Self {
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any);

        let query = Router::new()
            .route("/api/query/language", get(query_language))
            .route("/api/query/default", get(query_default))
            .layer(cors);

        let mut app = Router::new().route("/health", get(health)).merge(query);
        if config.admin.enabled {
            app = app.merge(admin::admin_router(state.clone()));
        }

        // Outermost first: the request ID exists before the trace span opens.
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        app.with_state(state).layer(middleware)
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    pub domain: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DefaultQuery {
    pub domain: Option<String>,
}

fn require_domain(domain: Option<String>) -> Result<String, ApiError> {
    domain
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::Validation("missing required parameter: domain".to_string()))
}

fn into_response(resolution: Resolution, mode: QueryMode) -> Result<Json<ResolutionResult>, ApiError> {
    match resolution {
        Resolution::Found(result) => Ok(Json(result)),
        Resolution::NotFound { domain, language } => Err(ApiError::NotFound(match (mode, language) {
            (QueryMode::Language, Some(language)) => {
                format!("no configuration for domain '{domain}' in language '{language}'")
            }
            _ => format!("no default configuration for domain '{domain}'"),
        })),
    }
}

/// `GET /api/query/language?domain=&lang=`
async fn query_language(
    State(state): State<AppState>,
    Query(params): Query<LanguageQuery>,
    headers: HeaderMap,
) -> Result<Json<ResolutionResult>, ApiError> {
    let domain = require_domain(params.domain)?;
    let language = state
        .negotiator
        .resolve(params.lang.as_deref(), accept_language(&headers));

    tracing::debug!(domain = %domain, language = %language, "Language query");
    let resolution = state.resolver.resolve_language(&domain, Some(&language)).await?;
    into_response(resolution, QueryMode::Language)
}

/// `GET /api/query/default?domain=`
async fn query_default(
    State(state): State<AppState>,
    Query(params): Query<DefaultQuery>,
) -> Result<Json<ResolutionResult>, ApiError> {
    let domain = require_domain(params.domain)?;

    tracing::debug!(domain = %domain, "Default query");
    let resolution = state.resolver.resolve_default(&domain).await?;
    into_response(resolution, QueryMode::Default)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: &'static str,
    pub store: &'static str,
}

/// `GET /health`
///
/// A down cache only slows resolution; a down store breaks it.
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let store_up = state.resolver.store_reachable().await;
    Json(HealthStatus {
        status: if store_up { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache: state.resolver.cache().health().await.as_str(),
        store: if store_up { "up" } else { "down" },
    })
}
