//! Error responses.
//!
//! # Status Mapping
//! - missing or empty `domain` → 400 `VALIDATION_ERROR`
//! - no candidate matched → 404 `NOT_FOUND`
//! - store failure or timeout → 503 `STORE_UNAVAILABLE`
//! - admin credentials wrong → 401 `UNAUTHORIZED`
//!
//! Absent data and an unreachable store never share a status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("configuration store unavailable")]
    StoreUnavailable(#[from] StoreError),

    #[error("invalid or missing admin credentials")]
    Unauthorized,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::StoreUnavailable(cause) = &self {
            tracing::error!(error = %cause, "Request failed on store error");
        }

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}
