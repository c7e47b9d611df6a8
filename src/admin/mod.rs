//! Admin routes: status and cache invalidation.
//!
//! The invalidation endpoints are the write-notification hooks for whatever
//! edits domains, configs and translations.

pub mod handlers;
pub mod auth;

use axum::{
    routing::{get, post},
    Router,
    middleware,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::admin_auth_middleware;

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache/invalidate", post(invalidate_all))
        .route("/admin/cache/invalidate/domain/{domain}", post(invalidate_domain))
        .route("/admin/cache/invalidate/config/{config_id}", post(invalidate_config))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
