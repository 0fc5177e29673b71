//! Error taxonomy for the prediction gateway.
//!
//! Every failure the gateway can observe while talking to the inference
//! service is a [`GatewayError`]. The retry executor only cares about the
//! coarse [`FailureKind`] each variant maps to.

use thiserror::Error;

use crate::resilience::FailureKind;

/// Errors that can occur while probing or classifying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// DNS failure, connection refused, or the connection dropped mid-request.
    #[error("Endpoint unreachable: {0}")]
    NetworkUnreachable(String),

    /// A single attempt exceeded its deadline.
    #[error("Request timed out after {0} ms")]
    RequestTimeout(u64),

    /// Upstream answered with a gateway/server-busy status (serverless wake-up).
    #[error("Upstream cold start (HTTP {status})")]
    ColdStart { status: u16 },

    /// Upstream answered with a status that is neither success nor busy.
    #[error("Unexpected upstream status HTTP {status}")]
    UnexpectedStatus { status: u16 },

    /// 2xx response with an unparseable or unrecognized body.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Recognized response shape whose label is not in the severity table.
    #[error("Unmapped severity label: {0:?}")]
    UnmappedLabel(String),

    /// Every candidate endpoint failed within policy.
    #[error("All {tried} endpoint(s) exhausted")]
    AllEndpointsExhausted { tried: usize },

    /// Caller-side problem with the submitted image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl GatewayError {
    /// Retry class used by the executor.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GatewayError::ColdStart { .. } => FailureKind::ColdStart,
            GatewayError::NetworkUnreachable(_) | GatewayError::RequestTimeout(_) => {
                FailureKind::TransientNetwork
            }
            GatewayError::UnexpectedStatus { status } if *status >= 500 => {
                FailureKind::TransientNetwork
            }
            _ => FailureKind::NonRetryable,
        }
    }

    /// Short machine-readable name, used as a metrics label and in diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NetworkUnreachable(_) => "network_unreachable",
            GatewayError::RequestTimeout(_) => "request_timeout",
            GatewayError::ColdStart { .. } => "cold_start",
            GatewayError::UnexpectedStatus { .. } => "unexpected_status",
            GatewayError::MalformedResponse(_) => "malformed_response",
            GatewayError::UnmappedLabel(_) => "unmapped_label",
            GatewayError::AllEndpointsExhausted { .. } => "all_endpoints_exhausted",
            GatewayError::InvalidImage(_) => "invalid_image",
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(GatewayError::ColdStart { status: 502 }.failure_kind(), FailureKind::ColdStart);
        assert_eq!(GatewayError::RequestTimeout(100).failure_kind(), FailureKind::TransientNetwork);
        assert_eq!(
            GatewayError::NetworkUnreachable("refused".into()).failure_kind(),
            FailureKind::TransientNetwork
        );
        assert_eq!(
            GatewayError::UnexpectedStatus { status: 500 }.failure_kind(),
            FailureKind::TransientNetwork
        );
        assert_eq!(
            GatewayError::UnexpectedStatus { status: 404 }.failure_kind(),
            FailureKind::NonRetryable
        );
        assert_eq!(
            GatewayError::MalformedResponse("x".into()).failure_kind(),
            FailureKind::NonRetryable
        );
        assert_eq!(
            GatewayError::UnmappedLabel("x".into()).failure_kind(),
            FailureKind::NonRetryable
        );
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::RequestTimeout(60000);
        assert_eq!(err.to_string(), "Request timed out after 60000 ms");

        let err = GatewayError::UnmappedLabel("Unknown-Label".into());
        assert!(err.to_string().contains("Unknown-Label"));
    }
}
