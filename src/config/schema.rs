//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::RetryPolicy;

/// Root configuration for the prediction gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound HTTP listener.
    pub listener: ListenerConfig,

    /// Inference service endpoints and wire details.
    pub upstream: UpstreamConfig,

    /// Health cache settings.
    pub health_check: HealthCheckConfig,

    /// Prediction retry settings.
    pub prediction: PredictionConfig,

    /// Fallback simulator settings.
    pub simulator: SimulatorConfig,

    /// Behaviour while the service is degraded.
    pub degraded: DegradedConfig,

    /// On-demand diagnostics.
    pub diagnostics: DiagnosticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request deadline for inbound calls, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 300,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Inference service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Ordered endpoint base URLs, primary first.
    pub endpoints: Vec<String>,

    /// Path of the info/liveness resource.
    pub info_path: String,

    /// Path of the prediction resource.
    pub predict_path: String,

    /// Multipart field carrying the image.
    pub file_field: String,

    /// `status` values that mark a live inference API.
    pub accepted_statuses: Vec<String>,

    /// `service` value that marks a live inference API.
    pub service_name: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://127.0.0.1:5000".to_string()],
            info_path: "/".to_string(),
            predict_path: "/predict".to_string(),
            file_field: "file".to_string(),
            accepted_statuses: vec!["online".to_string(), "ok".to_string()],
            service_name: "retinopathy-api".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// How long a probe result is reused, in milliseconds.
    pub cache_ttl_ms: u64,

    /// Probe once before accepting traffic.
    pub startup_probe: bool,

    /// Retry policy for each endpoint probe.
    pub retry: RetryPolicy,
}

impl HealthCheckConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 60_000,
            startup_probe: true,
            retry: RetryPolicy::health_check(),
        }
    }
}

/// Prediction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Retry policy for each endpoint during classification.
    pub retry: RetryPolicy,

    /// Budget for one classification, health refresh and failover included,
    /// in milliseconds. The simulator answers once it runs out.
    pub deadline_ms: u64,
}

impl PredictionConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::prediction(),
            deadline_ms: 240_000,
        }
    }
}

/// Fallback simulator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Inclusive lower bound of simulated confidence.
    pub confidence_min: f64,

    /// Exclusive upper bound of simulated confidence.
    pub confidence_max: f64,

    /// Fixed RNG seed for reproducible output; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            confidence_min: 0.70,
            confidence_max: 1.00,
            seed: None,
        }
    }
}

/// When to probe while the service is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Answer from the simulator now, refresh health in a background task.
    #[default]
    Background,
    /// Refresh health before answering once the entry is stale.
    Inline,
}

/// Degraded-mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DegradedConfig {
    pub probe_mode: ProbeMode,

    /// Still try the endpoints directly before simulating.
    pub attempt_direct: bool,
}

/// Diagnostics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Per-endpoint deadline, in milliseconds.
    pub timeout_ms: u64,

    /// Responses slower than this get a cold-start hint.
    pub slow_response_ms: u64,

    /// Bytes of an unrecognized body kept in the report.
    pub body_excerpt_bytes: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            slow_response_ms: 2_000,
            body_excerpt_bytes: 512,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.upstream.endpoints, vec!["http://127.0.0.1:5000"]);
        assert_eq!(config.health_check.cache_ttl_ms, 60_000);
        assert_eq!(config.health_check.retry, RetryPolicy::health_check());
        assert_eq!(config.prediction.retry, RetryPolicy::prediction());
        assert!(config.prediction.deadline() < Duration::from_secs(config.listener.request_timeout_secs));
        assert_eq!(config.degraded.probe_mode, ProbeMode::Background);
        assert!(!config.degraded.attempt_direct);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            endpoints = ["https://a.example", "https://b.example"]

            [degraded]
            probe_mode = "inline"

            [prediction.retry]
            max_attempts = 2
            base_delay_ms = 100
            cold_start_delay_ms = 500
            request_timeout_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.endpoints.len(), 2);
        assert_eq!(config.upstream.predict_path, "/predict");
        assert_eq!(config.degraded.probe_mode, ProbeMode::Inline);
        assert_eq!(config.prediction.retry.max_attempts, 2);
        assert_eq!(config.health_check.retry, RetryPolicy::health_check());
    }
}
