//! Metrics collection and exposition.
//!
//! # Metrics
//! - `boxkit_requests_total` (counter): instrumented requests by method, outcome code
//! - `boxkit_request_duration_seconds` (histogram): handler latency
//! - `boxkit_backend_initialized` (gauge): 1 once a facade backend is up
//! - `boxkit_cache_entries` (gauge): entries held by the memory cache
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is optional and bound to its own address

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::outcome::Code;

/// Install the Prometheus exporter with an HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one instrumented request.
pub fn record_request(method: &str, code: Code, elapsed: Duration) {
    let code = code.to_string();
    counter!(
        "boxkit_requests_total",
        "method" => method.to_string(),
        "code" => code.clone()
    )
    .increment(1);
    histogram!(
        "boxkit_request_duration_seconds",
        "method" => method.to_string(),
        "code" => code
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_backend_initialized(subsystem: &'static str) {
    gauge!("boxkit_backend_initialized", "subsystem" => subsystem).set(1.0);
}

pub fn record_cache_size(entries: usize) {
    gauge!("boxkit_cache_entries").set(entries as f64);
}
