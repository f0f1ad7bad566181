//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatched actions by action, status
//! - `router_dispatch_duration_seconds` (histogram): action latency
//! - `router_not_found_total` (counter): requests that matched no route
//! - `router_dispatch_failures_total` (counter): dispatches that failed
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Prometheus exposition is opt-in via configuration

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed dispatch.
pub fn record_dispatch(action: &str, status: u16, start: Instant) {
    let action = action.to_string();
    counter!(
        "router_dispatch_total",
        "action" => action.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("router_dispatch_duration_seconds", "action" => action)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request that matched no route or static mount.
pub fn record_not_found() {
    counter!("router_not_found_total").increment(1);
}

/// Record a dispatch that ended in an error.
pub fn record_failure(status: u16) {
    counter!("router_dispatch_failures_total", "status" => status.to_string()).increment(1);
}
