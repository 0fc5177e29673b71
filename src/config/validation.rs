//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint URLs are absolute http(s) and unique
//! - Retry policies are usable and keep cold-start waits above transient ones
//! - Value ranges (TTL > 0, confidence bounds, parseable addresses)
//! - The classification deadline ends before the inbound request timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::resilience::RetryPolicy;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("upstream.endpoints must list at least one endpoint")]
    NoEndpoints,

    #[error("endpoint '{url}' is invalid: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("endpoint '{0}' is listed more than once")]
    DuplicateEndpoint(String),

    #[error("{section}: {reason}")]
    InvalidRetryPolicy { section: &'static str, reason: String },

    #[error("health_check.cache_ttl_ms must be at least 1")]
    ZeroTtl,

    #[error("simulator confidence range [{min}, {max}) must satisfy 0 <= min < max <= 1")]
    InvalidConfidenceRange { min: f64, max: f64 },

    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error(
        "prediction.deadline_ms ({deadline_ms}) must be below listener.request_timeout_secs ({listener_ms} ms) so the fallback can answer"
    )]
    DeadlineExceedsListener { deadline_ms: u64, listener_ms: u64 },
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_endpoints(&config.upstream.endpoints, &mut errors);
    validate_policy("health_check.retry", &config.health_check.retry, &mut errors);
    validate_policy("prediction.retry", &config.prediction.retry, &mut errors);

    if config.health_check.cache_ttl_ms == 0 {
        errors.push(ValidationError::ZeroTtl);
    }

    let (min, max) = (config.simulator.confidence_min, config.simulator.confidence_max);
    if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min >= max {
        errors.push(ValidationError::InvalidConfidenceRange { min, max });
    }

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue { field: "listener.max_body_size" });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "listener.request_timeout_secs" });
    }
    let listener_ms = config.listener.request_timeout_secs.saturating_mul(1_000);
    if config.prediction.deadline_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "prediction.deadline_ms" });
    } else if listener_ms > 0 && config.prediction.deadline_ms >= listener_ms {
        errors.push(ValidationError::DeadlineExceedsListener {
            deadline_ms: config.prediction.deadline_ms,
            listener_ms,
        });
    }
    if config.diagnostics.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "diagnostics.timeout_ms" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoints(endpoints: &[String], errors: &mut Vec<ValidationError>) {
    if endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
        return;
    }

    let mut seen = HashSet::new();
    for raw in endpoints {
        let invalid = |reason: &str| ValidationError::InvalidEndpoint {
            url: raw.clone(),
            reason: reason.to_string(),
        };
        match Url::parse(raw.trim()) {
            Err(e) => errors.push(invalid(&e.to_string())),
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                errors.push(invalid("scheme must be http or https"))
            }
            Ok(url) if url.host_str().is_none() => errors.push(invalid("missing host")),
            Ok(url) => {
                let key = url.as_str().trim_end_matches('/').to_string();
                if !seen.insert(key) {
                    errors.push(ValidationError::DuplicateEndpoint(raw.clone()));
                }
            }
        }
    }
}

fn validate_policy(section: &'static str, policy: &RetryPolicy, errors: &mut Vec<ValidationError>) {
    let invalid = |reason: String| ValidationError::InvalidRetryPolicy { section, reason };

    if policy.max_attempts == 0 {
        errors.push(invalid("max_attempts must be at least 1".to_string()));
    }
    if policy.request_timeout_ms == 0 {
        errors.push(invalid("request_timeout_ms must be at least 1".to_string()));
    }

    // The longest linear wait happens before the last attempt.
    let longest_linear = policy
        .base_delay_ms
        .saturating_mul(u64::from(policy.max_attempts.saturating_sub(1)));
    if policy.cold_start_delay_ms <= longest_linear {
        errors.push(invalid(format!(
            "cold_start_delay_ms ({}) must exceed base_delay_ms x (max_attempts - 1) ({})",
            policy.cold_start_delay_ms, longest_linear
        )));
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.upstream.endpoints = vec![
            "ftp://files.example".to_string(),
            "not a url".to_string(),
            "http://a.example".to_string(),
            "http://a.example/".to_string(),
        ];
        config.health_check.cache_ttl_ms = 0;
        config.simulator.confidence_min = 0.9;
        config.simulator.confidence_max = 0.8;
        config.listener.bind_address = "localhost".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::DuplicateEndpoint("http://a.example/".to_string())));
        assert!(errors.contains(&ValidationError::ZeroTtl));
    }

    #[test]
    fn test_empty_endpoints() {
        let mut config = GatewayConfig::default();
        config.upstream.endpoints.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoEndpoints]));
    }

    #[test]
    fn test_cold_start_must_exceed_linear_backoff() {
        let mut config = GatewayConfig::default();
        config.prediction.retry = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 3_000,
            cold_start_delay_ms: 6_000,
            request_timeout_ms: 1_000,
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidRetryPolicy { section: "prediction.retry", .. }
        ));

        config.prediction.retry.cold_start_delay_ms = 6_001;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_deadline_must_end_before_listener_timeout() {
        let mut config = GatewayConfig::default();
        config.listener.request_timeout_secs = 2;
        config.prediction.deadline_ms = 2_000;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DeadlineExceedsListener {
                deadline_ms: 2_000,
                listener_ms: 2_000,
            }])
        );

        config.prediction.deadline_ms = 1_500;
        assert!(validate_config(&config).is_ok());

        config.prediction.deadline_ms = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::ZeroValue { field: "prediction.deadline_ms" }])
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = GatewayConfig::default();
        config.health_check.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
