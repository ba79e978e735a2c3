//! Structured logging helpers.
//!
//! Every event carries an `event` field so log pipelines can filter on it.

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, honouring `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_startup(component: &str, status: &str, detail: Option<&str>) {
    match detail {
        Some(detail) => info!(event = "startup", component, status, detail),
        None => info!(event = "startup", component, status),
    }
}

pub fn log_info(message: &str, context: &str, event: &str) {
    info!(event, context, "{}", message);
}

pub fn log_rate_limit_event(key: &str, path: &str, limit: u64, retry_after_secs: u64) {
    warn!(
        event = "rate_limited",
        key,
        path,
        limit,
        retry_after_secs,
        "Request rejected by rate limiter"
    );
}

pub fn log_cache_event(cache: &str, key: &str, outcome: &str) {
    debug!(event = "cache_lookup", cache, key, outcome);
}

pub fn log_performance_metric(metric: &str, value: f64, unit: &str, context: &str) {
    info!(event = "metric", metric, value, unit, context);
}
