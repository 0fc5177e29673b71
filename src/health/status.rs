//! Health status model and probe-response recognition.
//!
//! # States
//! ```text
//! Unchecked → Probing → Healthy(endpoint) | Degraded
//! Healthy  → Probing: cache entry expired
//! Degraded → Probing: next call after the TTL elapsed
//! ```

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, GatewayResult};

/// Rules deciding whether an info response comes from a live inference API.
#[derive(Debug, Clone)]
pub struct ProbeRules {
    pub accepted_statuses: Vec<String>,
    pub service_name: String,
}

impl ProbeRules {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            accepted_statuses: config.accepted_statuses.clone(),
            service_name: config.service_name.clone(),
        }
    }

    /// `status` is one of the accepted sentinels, or `service` names the expected API.
    pub fn recognizes(&self, body: &Value) -> bool {
        let status_ok = body
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| self.accepted_statuses.iter().any(|a| a == s));
        let service_ok = body
            .get("service")
            .and_then(Value::as_str)
            .is_some_and(|s| s == self.service_name);
        status_ok || service_ok
    }
}

/// A recognized info response.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoResponse {
    pub body: Value,
    /// Upstream reports it is fabricating predictions itself.
    pub upstream_simulation: bool,
    pub model_loaded: Option<bool>,
}

impl InfoResponse {
    /// Parse and recognize an info body. A 2xx with an unrecognized body is
    /// a [`GatewayError::MalformedResponse`], not a soft success.
    pub fn parse(body: &str, rules: &ProbeRules) -> GatewayResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| GatewayError::MalformedResponse(format!("info body is not JSON: {}", e)))?;

        if !rules.recognizes(&value) {
            return Err(GatewayError::MalformedResponse(
                "info body has no recognized liveness indicator".to_string(),
            ));
        }

        let flag = |key: &str| value.get(key).and_then(Value::as_bool);
        Ok(Self {
            upstream_simulation: flag("simulation_mode_enabled") == Some(true)
                || flag("simulation_mode") == Some(true),
            model_loaded: flag("model_loaded"),
            body: value,
        })
    }
}

/// Last known reachability of the inference service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub available: bool,
    /// Wall-clock time of the last completed probe, milliseconds since epoch.
    pub last_checked_at: Option<u64>,
    pub cache_ttl_ms: u64,
    pub info: Option<Value>,
    pub active_endpoint: Option<String>,
    /// Refresh cycles in a row in which every endpoint failed.
    pub consecutive_failure_count: u32,
    /// Predictions are currently served by the fallback simulator.
    pub simulation_active: bool,
    pub upstream_simulation: bool,
    /// Raw detail of the last failed cycle, for logs only; diagnostics report it.
    #[serde(skip)]
    pub last_error: Option<String>,
    #[serde(skip)]
    pub(crate) checked_at: Option<Instant>,
    #[serde(skip)]
    invalidated: bool,
}

impl HealthStatus {
    /// Status before the first probe.
    pub fn unchecked(cache_ttl: Duration) -> Self {
        Self {
            available: false,
            last_checked_at: None,
            cache_ttl_ms: cache_ttl.as_millis() as u64,
            info: None,
            active_endpoint: None,
            consecutive_failure_count: 0,
            simulation_active: false,
            upstream_simulation: false,
            last_error: None,
            checked_at: None,
            invalidated: false,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked_at.is_some()
    }

    /// Age is below the TTL and nothing has invalidated the entry.
    pub fn is_fresh(&self) -> bool {
        !self.invalidated
            && self
                .checked_at
                .is_some_and(|at| at.elapsed() < Duration::from_millis(self.cache_ttl_ms))
    }

    /// Copy of this status that the cache will treat as expired.
    pub fn expired(&self) -> Self {
        Self {
            invalidated: true,
            ..self.clone()
        }
    }

    pub(crate) fn stamp(&mut self) {
        self.checked_at = Some(Instant::now());
        self.last_checked_at = Some(epoch_millis());
        self.invalidated = false;
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
