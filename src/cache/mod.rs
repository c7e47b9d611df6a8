//! Cache subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver candidate (domain, language)
//!     → keys.rs (cache key)
//!     → store.rs (typed get/set, jittered TTL, negative entries)
//!     → codec.rs (JSON text, NULL marker, non-finite sentinels)
//!     → backend.rs (raw string key-value store)
//! ```
//!
//! # Design Decisions
//! - The cache is a hint: every failure degrades to "absent"
//! - Negative entries suppress repeated backing-store misses
//! - Random TTL spread avoids synchronized expiry
//! - No locking across requests; last writer wins

pub mod backend;
pub mod codec;
pub mod keys;
pub mod store;

use std::time::Duration;
use thiserror::Error;

pub use backend::{CacheBackend, MemoryBackend, ScanPage};
pub use codec::Blob;
pub use store::{CacheHealth, CacheLookup, CacheSettings, CacheStore};

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-related errors. Never escape `CacheStore`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid key pattern: {0}")]
    Pattern(String),
}
