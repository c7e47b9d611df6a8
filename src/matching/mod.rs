//! Request matching subsystem.
//!
//! # Data Flow
//! ```text
//! Raw request parameters (domain, lang, Accept-Language)
//!     → domain.rs (canonical domain + root fallback)
//!     → language.rs (negotiated language code)
//!     → Return: inputs for the config resolver
//! ```
//!
//! # Design Decisions
//! - Both components are pure functions of their input
//! - Deterministic: same input always yields the same candidate
//! - No I/O, no failure modes

pub mod domain;
pub mod language;

pub use domain::{canonicalize, CanonicalDomain};
pub use language::{normalize as normalize_language, LanguageNegotiator};
