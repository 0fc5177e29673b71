//! Retry policy definitions.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Immutable retry configuration, one instance per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Linear backoff unit for transient network failures, in milliseconds.
    pub base_delay_ms: u64,

    /// Fixed wait after a cold-start response, in milliseconds.
    pub cold_start_delay_ms: u64,

    /// Deadline for a single attempt, in milliseconds.
    pub request_timeout_ms: u64,
}

impl RetryPolicy {
    /// Policy for info probes issued by the health cache.
    pub const fn health_check() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 3_000,
            cold_start_delay_ms: 10_000,
            request_timeout_ms: 20_000,
        }
    }

    /// Policy for prediction requests.
    pub const fn prediction() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 3_000,
            cold_start_delay_ms: 15_000,
            request_timeout_ms: 60_000,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Upper bound on the time one executor run may take against one endpoint.
    pub fn worst_case(&self) -> Duration {
        let mut total = self.request_timeout_ms.saturating_mul(self.max_attempts as u64);
        for attempt in 1..self.max_attempts {
            let linear = self.base_delay_ms.saturating_mul(attempt as u64);
            total = total.saturating_add(linear.max(self.cold_start_delay_ms));
        }
        Duration::from_millis(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let health = RetryPolicy::health_check();
        assert_eq!(health.max_attempts, 3);
        assert_eq!(health.cold_start_delay_ms, 10_000);

        let predict = RetryPolicy::prediction();
        assert_eq!(predict.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_worst_case_bound() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 100,
            cold_start_delay_ms: 500,
            request_timeout_ms: 1_000,
        };
        // 3 attempts of 1s plus two waits of at most 500ms each.
        assert_eq!(policy.worst_case(), Duration::from_millis(4_000));
    }
}
