//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the events the resolver and cache report
//! - Forward them to the `metrics` facade (Prometheus exporter)
//!
//! # Metrics
//! - `config_cache_lookups_total` (counter): by `outcome` (hit, negative, miss)
//! - `config_cache_errors_total` (counter): by `operation`
//! - `config_store_queries_total` (counter): by `operation`, `outcome`
//! - `config_store_query_duration_seconds` (histogram): by `operation`
//! - `config_resolutions_total` (counter): by `mode`, `outcome`, `tier`
//!
//! # Design Decisions
//! - Components receive a sink at construction; there are no global counters
//!   in the core, so tests can observe exactly what one resolver did

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Outcome of a single cache read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Negative,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Negative => "negative",
            CacheOutcome::Miss => "miss",
        }
    }
}

/// Outcome of a single backing-store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Found,
    Absent,
    Failed,
}

impl StoreOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOutcome::Found => "found",
            StoreOutcome::Absent => "absent",
            StoreOutcome::Failed => "failed",
        }
    }
}

/// Receiver for resolver and cache events. All methods default to no-ops.
pub trait MetricsSink: Send + Sync {
    fn record_cache_lookup(&self, _outcome: CacheOutcome) {}

    fn record_cache_error(&self, _operation: &'static str) {}

    fn record_store_query(&self, _operation: &'static str, _outcome: StoreOutcome, _elapsed: Duration) {}

    /// `tier` is the 1-based candidate that produced the result, if any.
    fn record_resolution(&self, _mode: &'static str, _outcome: &'static str, _tier: Option<usize>) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {}

/// Forwards events to the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn record_cache_lookup(&self, outcome: CacheOutcome) {
        metrics::counter!("config_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
    }

    fn record_cache_error(&self, operation: &'static str) {
        metrics::counter!("config_cache_errors_total", "operation" => operation).increment(1);
    }

    fn record_store_query(&self, operation: &'static str, outcome: StoreOutcome, elapsed: Duration) {
        metrics::counter!(
            "config_store_queries_total",
            "operation" => operation,
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!("config_store_query_duration_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());
    }

    fn record_resolution(&self, mode: &'static str, outcome: &'static str, tier: Option<usize>) {
        let tier = tier.map(|t| t.to_string()).unwrap_or_else(|| "none".to_string());
        metrics::counter!(
            "config_resolutions_total",
            "mode" => mode,
            "outcome" => outcome,
            "tier" => tier
        )
        .increment(1);
    }
}

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(CacheOutcome::Negative.as_str(), "negative");
        assert_eq!(StoreOutcome::Failed.as_str(), "failed");
    }

    #[test]
    fn test_prometheus_sink_without_recorder_is_harmless() {
        let sink = PrometheusSink;
        sink.record_cache_lookup(CacheOutcome::Hit);
        sink.record_store_query("find_domain", StoreOutcome::Found, Duration::from_millis(3));
        sink.record_resolution("language", "found", Some(2));
    }
}
