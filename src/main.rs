//! Domain configuration resolution service.
//!
//! Resolves `(domain, language)` requests to localized configuration
//! payloads with domain and language fallback.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 CONFIG SERVICE                    │
//!                      │                                                  │
//!     Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────┐  │
//!     ─────────────────┼─▶│  http   │───▶│ matching │───▶│  resolver  │  │
//!                      │  │ server  │    │domain/lng│    │  fallback  │  │
//!                      │  └─────────┘    └──────────┘    └─────┬──────┘  │
//!                      │                                       │         │
//!                      │                          ┌────────────┴──────┐  │
//!                      │                          ▼                   ▼  │
//!                      │                    ┌──────────┐       ┌───────┐ │
//!                      │                    │  cache   │       │ store │ │
//!                      │                    └──────────┘       └───────┘ │
//!                      │                                                  │
//!                      │  config · observability · resilience · lifecycle │
//!                      └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use domain_config::config::{load_config, ServiceConfig};
use domain_config::lifecycle;
use domain_config::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "domain-config")]
#[command(about = "Domain configuration resolution service", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "domain-config starting"
    );

    lifecycle::run(config).await?;
    Ok(())
}
