//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver, cache, HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and histograms through an injected sink)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every HTTP log line
//! - Metrics sinks are injected, never reached through globals by the core

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSink, NoopSink, PrometheusSink};
