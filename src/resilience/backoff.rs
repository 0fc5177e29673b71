//! Backoff delay calculation.

use std::time::Duration;

use crate::resilience::{FailureKind, RetryPolicy};

/// Delay to wait after attempt number `attempt` (1-based) failed with `kind`.
///
/// Cold starts wait a fixed `cold_start_delay_ms`; transient network failures
/// back off linearly (`base_delay_ms * attempt`). Non-retryable failures never
/// wait because the executor stops on them.
pub fn retry_delay(kind: FailureKind, attempt: u32, policy: &RetryPolicy) -> Duration {
    match kind {
        FailureKind::ColdStart => Duration::from_millis(policy.cold_start_delay_ms),
        FailureKind::TransientNetwork => {
            Duration::from_millis(policy.base_delay_ms.saturating_mul(attempt as u64))
        }
        FailureKind::NonRetryable => Duration::ZERO,
    }
}
