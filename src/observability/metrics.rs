//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): responses by route, status
//! - `http_request_duration_seconds` (histogram): time from accept to response written
//! - `http_active_connections` (gauge): current session count
//! - `http_transport_errors_total` (counter): failed reads/writes by kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one answered request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!("http_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("http_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("http_active_connections").decrement(1.0);
}

/// Record a session that ended on a transport failure.
pub fn record_transport_error(kind: &'static str) {
    metrics::counter!("http_transport_errors_total", "kind" => kind).increment(1);
}
