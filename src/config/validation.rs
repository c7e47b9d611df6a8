//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the language set is coherent (default is supported)
//! - Validate value ranges (TTLs, timeouts, jitter)
//! - Check addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::matching::normalize_language;

/// Negative entries must live at most this fraction of a positive entry.
const NEGATIVE_TTL_DIVISOR: u64 = 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed config. Language codes are compared in normalized form.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let default = normalize_language(&config.languages.default);
    if default.is_empty() {
        errors.push(ValidationError::new("languages.default", "must not be empty"));
    }
    if config.languages.supported.is_empty() {
        errors.push(ValidationError::new("languages.supported", "must list at least one language"));
    } else if !default.is_empty()
        && !config
            .languages
            .supported
            .iter()
            .any(|code| normalize_language(code) == default)
    {
        errors.push(ValidationError::new(
            "languages.default",
            format!("'{}' is not in languages.supported", config.languages.default),
        ));
    }

    let cache = &config.cache;
    if cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }
    if cache.negative_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.negative_ttl_secs", "must be greater than 0"));
    } else if cache.negative_ttl_secs.saturating_mul(NEGATIVE_TTL_DIVISOR) > cache.ttl_secs {
        errors.push(ValidationError::new(
            "cache.negative_ttl_secs",
            format!(
                "must be at most 1/{NEGATIVE_TTL_DIVISOR} of cache.ttl_secs ({})",
                cache.ttl_secs
            ),
        ));
    }
    if !(0.0..1.0).contains(&cache.jitter_ratio) {
        errors.push(ValidationError::new("cache.jitter_ratio", "must be in [0, 1)"));
    }
    if cache.operation_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.operation_timeout_ms", "must be greater than 0"));
    }
    if cache.scan_batch_size == 0 {
        errors.push(ValidationError::new("cache.scan_batch_size", "must be greater than 0"));
    }

    if config.store.query_timeout_ms == 0 {
        errors.push(ValidationError::new("store.query_timeout_ms", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when admin routes are enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
