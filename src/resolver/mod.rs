//! Configuration resolution.
//!
//! # Data Flow
//! ```text
//! (domain input, language)
//!     → matching (canonical domain, normalized language)
//!     → candidates.rs (ordered (domain, language) plan)
//!     → engine.rs (cache, then store, per candidate)
//!     → Resolution::Found | Resolution::NotFound | StoreError
//! ```

pub mod candidates;
pub mod engine;
pub mod types;

pub use candidates::Candidate;
pub use engine::{ConfigResolver, ResolverSettings};
pub use types::{ConfigPayload, QueryMode, Resolution, ResolutionResult};
