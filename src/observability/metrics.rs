//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gemgate_fetches_total` (counter): gemini fetches by status class
//! - `gemgate_fetch_duration_seconds` (histogram): fetch latency up to the response header
//! - `gemgate_theme_cache_entries` (gauge): hosts with a cached theme

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            metrics::describe_counter!("gemgate_fetches_total", "Gemini fetches by status class");
            metrics::describe_histogram!(
                "gemgate_fetch_duration_seconds",
                "Time until the gemini response header arrived"
            );
            metrics::describe_gauge!("gemgate_theme_cache_entries", "Hosts with a cached theme");
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed fetch; `class` is a status class label or "transport_error".
pub fn record_fetch(class: &'static str, start: Instant) {
    metrics::counter!("gemgate_fetches_total", "class" => class).increment(1);
    metrics::histogram!("gemgate_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_theme_cache_size(entries: usize) {
    metrics::gauge!("gemgate_theme_cache_entries").set(entries as f64);
}
