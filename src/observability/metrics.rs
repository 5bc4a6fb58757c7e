//! Metrics collection and exposition.
//!
//! # Metrics
//! - `probe_http_requests_total` (counter): requests by method, status
//! - `probe_http_request_duration_seconds` (histogram): latency by method, status
//! - `probe_gate_resets_total` (counter): resets per gate
//! - `probe_gate_achieved` (gauge): 1=achieved, 0=pending, per gate
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter
//! - The exporter serves its own HTTP endpoint, separate from the probes

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and start its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    let method = method.to_owned();
    let status = status.to_string();
    counter!(
        "probe_http_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "probe_http_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_gate_reset(gate: &'static str) {
    counter!("probe_gate_resets_total", "gate" => gate).increment(1);
}

pub fn record_gate_state(gate: &'static str, achieved: bool) {
    gauge!("probe_gate_achieved", "gate" => gate).set(if achieved { 1.0 } else { 0.0 });
}
