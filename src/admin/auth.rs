use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::http::response::ApiError;
use crate::http::server::AppState;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Rejects admin requests that do not carry the configured key.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_authorized(request.headers(), &state.admin.api_key) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    Err(ApiError::Unauthorized)
}

/// Accepts the key as `Authorization: Bearer <key>`, as the password of
/// `Authorization: Basic <user:key>` (any user name), or as
/// `X-Admin-Password: <key>`. An empty configured key rejects everything.
pub fn is_authorized(headers: &HeaderMap, api_key: &str) -> bool {
    if api_key.is_empty() {
        return false;
    }

    let authorization = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    let bearer = authorization.and_then(|v| v.strip_prefix("Bearer "));
    let basic = authorization
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(basic_password);
    let password = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|h| h.to_str().ok());

    bearer == Some(api_key) || basic.as_deref() == Some(api_key) || password == Some(api_key)
}

/// Password half of a Basic credential.
fn basic_password(encoded: &str) -> Option<String> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (_, password) = credentials.split_once(':')?;
    Some(password.to_string())
}
