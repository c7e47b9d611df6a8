//! Domain configuration resolution service library.

pub mod admin;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod matching;
pub mod observability;
pub mod resilience;
pub mod resolver;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resolver::{ConfigResolver, Resolution, ResolutionResult};
