//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Cache call → timeouts.rs (deadline) → on expiry: CacheError::Timeout (swallowed)
//! Store call → timeouts.rs (deadline) → on expiry: StoreError::Timeout (propagated)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries inside the core; retry policy belongs to the caller

pub mod timeouts;
