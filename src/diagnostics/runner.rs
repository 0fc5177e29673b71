//! Full connectivity test across the endpoint pool.
//!
//! # Responsibilities
//! - Probe every endpoint concurrently, once, with no retries
//! - Record status, latency, body excerpt and error class per endpoint
//! - Turn findings into remediation advice for an operator
//!
//! Reads the pool but never rotates it and never touches the health cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::time;

use crate::config::DiagnosticsConfig;
use crate::endpoints::{Endpoint, EndpointPool};
use crate::error::GatewayError;
use crate::health::status::{epoch_millis, InfoResponse};
use crate::observability::metrics;
use crate::prediction::labels;
use crate::upstream::client::check_status;
use crate::upstream::UpstreamClient;

/// Result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDiagnostic {
    pub position: usize,
    pub url: String,
    /// A TCP connection was made and an HTTP response came back.
    pub reachable: bool,
    /// The response identified itself as the inference API.
    pub recognized: bool,
    pub http_status: Option<u16>,
    pub latency_ms: u64,
    pub body_excerpt: Option<String>,
    pub error_kind: Option<&'static str>,
    pub error: Option<String>,
    pub upstream_simulation: bool,
    pub model_loaded: Option<bool>,
}

/// Report for the whole pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub started_at: u64,
    pub duration_ms: u64,
    /// Position of the pool's current endpoint when the run started.
    pub current_position: usize,
    pub usable_count: usize,
    /// Version of the label table predictions are normalized with.
    pub label_table_version: u32,
    pub endpoints: Vec<EndpointDiagnostic>,
    pub recommendations: Vec<String>,
}

impl DiagnosticReport {
    pub fn any_usable(&self) -> bool {
        self.usable_count > 0
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosticsRunner {
    pool: Arc<EndpointPool>,
    client: UpstreamClient,
    config: DiagnosticsConfig,
}

impl DiagnosticsRunner {
    pub fn new(pool: Arc<EndpointPool>, client: UpstreamClient, config: DiagnosticsConfig) -> Self {
        Self { pool, client, config }
    }

    pub async fn run_full(&self) -> DiagnosticReport {
        let started_at = epoch_millis();
        let started = Instant::now();
        let current_position = self.pool.current().position();
        metrics::record_diagnostics_run();

        let endpoints = join_all(self.pool.all().iter().map(|e| self.probe(e))).await;

        let usable_count = endpoints.iter().filter(|d| d.recognized).count();
        let recommendations = recommendations(&endpoints, &self.config);

        tracing::info!(
            endpoints = endpoints.len(),
            usable = usable_count,
            label_table_version = labels::TABLE_VERSION,
            duration_ms = started.elapsed().as_millis() as u64,
            "Diagnostics completed"
        );

        DiagnosticReport {
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            current_position,
            usable_count,
            label_table_version: labels::TABLE_VERSION,
            endpoints,
            recommendations,
        }
    }

    async fn probe(&self, endpoint: &Endpoint) -> EndpointDiagnostic {
        let deadline = Duration::from_millis(self.config.timeout_ms);
        let started = Instant::now();
        let outcome = time::timeout(deadline, self.client.fetch_info_raw(endpoint)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut diagnostic = EndpointDiagnostic {
            position: endpoint.position(),
            url: endpoint.to_string(),
            reachable: false,
            recognized: false,
            http_status: None,
            latency_ms,
            body_excerpt: None,
            error_kind: None,
            error: None,
            upstream_simulation: false,
            model_loaded: None,
        };

        let reply = match outcome {
            Err(_) => {
                diagnostic.fail(GatewayError::RequestTimeout(self.config.timeout_ms));
                return diagnostic;
            }
            Ok(Err(e)) => {
                diagnostic.fail(e);
                return diagnostic;
            }
            Ok(Ok(reply)) => reply,
        };

        diagnostic.reachable = true;
        diagnostic.http_status = Some(reply.status);
        diagnostic.body_excerpt = Some(excerpt(&reply.body, self.config.body_excerpt_bytes));

        let parsed = check_status(reply.status)
            .and_then(|()| InfoResponse::parse(&reply.body, self.client.rules()));
        match parsed {
            Ok(info) => {
                diagnostic.recognized = true;
                diagnostic.upstream_simulation = info.upstream_simulation;
                diagnostic.model_loaded = info.model_loaded;
            }
            Err(e) => diagnostic.fail(e),
        }
        diagnostic
    }
}

impl EndpointDiagnostic {
    fn fail(&mut self, error: GatewayError) {
        self.error_kind = Some(error.code());
        self.error = Some(error.to_string());
    }
}

/// First `max_bytes` of `body`, cut on a character boundary.
fn excerpt(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }
    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

fn recommendations(endpoints: &[EndpointDiagnostic], config: &DiagnosticsConfig) -> Vec<String> {
    let mut advice = Vec::new();

    for d in endpoints {
        let url = &d.url;
        match d.error_kind {
            Some("network_unreachable") => advice.push(format!(
                "{url}: endpoint unreachable, check DNS, the URL and that the service is running"
            )),
            Some("request_timeout") => advice.push(format!(
                "{url}: no response within {} ms, the service may be cold-starting; retry in a minute",
                config.timeout_ms
            )),
            Some("cold_start") => advice.push(format!(
                "{url}: HTTP {} while the service wakes up (cold start); retry shortly",
                d.http_status.unwrap_or_default()
            )),
            Some("unexpected_status") => advice.push(format!(
                "{url}: unexpected HTTP {}, check the info path and the service logs",
                d.http_status.unwrap_or_default()
            )),
            Some(_) => advice.push(format!(
                "{url}: reachable but the response is not a recognized inference API, check the URL points at the model service"
            )),
            None => {}
        }

        if d.upstream_simulation {
            advice.push(format!(
                "{url}: endpoint reachable but running in simulation mode upstream; predictions are not from the model"
            ));
        }
        if d.model_loaded == Some(false) {
            advice.push(format!("{url}: model not loaded upstream, check the model file on the server"));
        }
        if d.reachable && d.latency_ms >= config.slow_response_ms {
            advice.push(format!(
                "{url}: responded in {} ms, a slow response usually means a cold start or an overloaded host",
                d.latency_ms
            ));
        }
    }

    let usable = endpoints.iter().filter(|d| d.recognized).count();
    if usable == 0 {
        advice.push("No endpoint is usable; the gateway will serve simulated predictions".to_string());
    } else if advice.is_empty() {
        advice.push("All endpoints healthy".to_string());
    } else {
        advice.push(format!("{} of {} endpoint(s) usable", usable, endpoints.len()));
    }
    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(url: &str) -> EndpointDiagnostic {
        EndpointDiagnostic {
            position: 0,
            url: url.to_string(),
            reachable: true,
            recognized: true,
            http_status: Some(200),
            latency_ms: 10,
            body_excerpt: Some("{}".to_string()),
            error_kind: None,
            error: None,
            upstream_simulation: false,
            model_loaded: Some(true),
        }
    }

    #[test]
    fn test_excerpt_respects_char_boundary() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdef", 3), "abc…");
        // 'é' is two bytes; cutting at 2 would split it.
        assert_eq!(excerpt("aéb", 2), "a…");
    }

    #[test]
    fn test_all_healthy() {
        let advice = recommendations(&[diagnostic("http://a")], &DiagnosticsConfig::default());
        assert_eq!(advice, vec!["All endpoints healthy".to_string()]);
    }

    #[test]
    fn test_unreachable_and_simulating() {
        let mut dead = diagnostic("http://dead");
        dead.reachable = false;
        dead.recognized = false;
        dead.http_status = None;
        dead.error_kind = Some("network_unreachable");

        let mut simulating = diagnostic("http://sim");
        simulating.upstream_simulation = true;
        simulating.model_loaded = Some(false);

        let advice = recommendations(&[dead, simulating], &DiagnosticsConfig::default());
        assert!(advice[0].contains("http://dead") && advice[0].contains("check DNS"));
        assert!(advice.iter().any(|a| a.contains("simulation mode upstream")));
        assert!(advice.iter().any(|a| a.contains("model not loaded")));
        assert_eq!(advice.last().unwrap(), "1 of 2 endpoint(s) usable");
    }

    #[test]
    fn test_slow_and_none_usable() {
        let mut slow = diagnostic("http://slow");
        slow.recognized = false;
        slow.latency_ms = 5_000;
        slow.http_status = Some(503);
        slow.error_kind = Some("cold_start");

        let advice = recommendations(&[slow], &DiagnosticsConfig::default());
        assert!(advice.iter().any(|a| a.contains("cold start")));
        assert!(advice.iter().any(|a| a.contains("5000 ms")));
        assert!(advice.last().unwrap().contains("simulated predictions"));
    }
}
