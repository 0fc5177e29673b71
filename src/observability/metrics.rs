//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (probes, predictions, retries, fallbacks)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-endpoint and aggregate metrics
//!
//! # Metrics
//! - `gateway_health_probes_total` (counter): probes by endpoint, outcome
//! - `gateway_health_probe_duration_seconds` (histogram): probe latency incl. retries
//! - `gateway_service_available` (gauge): 1=available, 0=degraded
//! - `gateway_predictions_total` (counter): endpoint attempts by endpoint, outcome
//! - `gateway_prediction_duration_seconds` (histogram): per-endpoint latency incl. retries
//! - `gateway_attempt_failures_total` (counter): failed attempts by operation, kind
//! - `gateway_simulated_predictions_total` (counter): fallback results served
//! - `gateway_diagnostics_runs_total` (counter): diagnostics invocations
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::FailureKind;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(endpoint: &str, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "failed" };
    counter!(
        "gateway_health_probes_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_health_probe_duration_seconds", "endpoint" => endpoint.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_service_available(available: bool) {
    gauge!("gateway_service_available").set(if available { 1.0 } else { 0.0 });
}

/// `outcome` is `"ok"` or a [`crate::error::GatewayError::code`].
pub fn record_prediction(endpoint: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "gateway_predictions_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_prediction_duration_seconds", "endpoint" => endpoint.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_attempt_failure(operation: &str, kind: FailureKind) {
    counter!(
        "gateway_attempt_failures_total",
        "operation" => operation.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_simulated() {
    counter!("gateway_simulated_predictions_total").increment(1);
}

pub fn record_diagnostics_run() {
    counter!("gateway_diagnostics_runs_total").increment(1);
}
