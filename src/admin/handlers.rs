use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::matching::canonicalize;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cache: &'static str,
    pub default_language: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct InvalidationSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<i64>,
    pub removed: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cache: state.resolver.cache().health().await.as_str(),
        default_language: state.resolver.default_language().to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn invalidate_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<InvalidationSummary> {
    let removed = state.resolver.invalidate_domain(&domain).await;
    Json(InvalidationSummary {
        domain: Some(canonicalize(&domain).clean),
        config_id: None,
        removed,
    })
}

pub async fn invalidate_config(
    State(state): State<AppState>,
    Path(config_id): Path<i64>,
) -> Result<Json<InvalidationSummary>, ApiError> {
    let removed = state.resolver.invalidate_config(config_id).await?;
    Ok(Json(InvalidationSummary {
        domain: None,
        config_id: Some(config_id),
        removed,
    }))
}

pub async fn invalidate_all(State(state): State<AppState>) -> Json<InvalidationSummary> {
    let removed = state.resolver.invalidate_all().await;
    Json(InvalidationSummary {
        domain: None,
        config_id: None,
        removed,
    })
}
