//! Generic retry executor.
//!
//! # Responsibilities
//! - Run a fallible async operation up to `max_attempts` times
//! - Enforce the per-attempt deadline
//! - Pick the wait strategy from the failure class
//!
//! The executor knows nothing about endpoints or classification; callers
//! decide what an attempt means.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio::time;

use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::resilience::{backoff::retry_delay, RetryPolicy};

/// Retry class of a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Upstream is waking up; wait the fixed cold-start delay.
    ColdStart,
    /// Connection refused, DNS failure or timeout; back off linearly.
    TransientNetwork,
    /// Retrying against the same endpoint cannot help.
    NonRetryable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ColdStart => "cold_start",
            FailureKind::TransientNetwork => "transient_network",
            FailureKind::NonRetryable => "non_retryable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of an executor run that never succeeded.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} failed after {attempts} attempt(s) ({kind}): {last_error}")]
pub struct Failure {
    pub operation: String,
    pub kind: FailureKind,
    pub attempts: u32,
    pub last_error: GatewayError,
}

/// Run `op` under `policy`.
///
/// `op` receives the 1-based attempt number. Each attempt is wrapped in the
/// policy's request timeout; a timed-out attempt counts as
/// [`GatewayError::RequestTimeout`]. Non-retryable failures end the run
/// immediately. Dropping the returned future cancels the in-flight attempt
/// and any pending backoff.
pub async fn run<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, Failure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match time::timeout(policy.request_timeout(), op(attempt)).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    tracing::debug!(operation, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Err(e)) => e,
            Err(_) => GatewayError::RequestTimeout(policy.request_timeout_ms),
        };

        let kind = error.failure_kind();
        metrics::record_attempt_failure(operation, kind);

        if kind == FailureKind::NonRetryable || attempt >= max_attempts {
            tracing::warn!(
                operation,
                attempt,
                kind = %kind,
                error = %error,
                "Giving up"
            );
            return Err(Failure {
                operation: operation.to_string(),
                kind,
                attempts: attempt,
                last_error: error,
            });
        }

        let delay = retry_delay(kind, attempt, policy);
        tracing::info!(
            operation,
            attempt,
            kind = %kind,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying"
        );
        time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 100,
            cold_start_delay_ms: 1_000,
            request_timeout_ms: 5_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let started = Instant::now();

        let result = run(&policy(), "probe", move |_| {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GatewayError::NetworkUnreachable("connection refused".into()))
                } else {
                    Ok("up")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "up");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Linear: 100ms after attempt 1, 200ms after attempt 2.
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_waits_longer_than_transient() {
        let started = Instant::now();
        let _ = run(&policy(), "probe", |_| async {
            Err::<(), _>(GatewayError::ColdStart { status: 502 })
        })
        .await;
        let cold = started.elapsed();

        let started = Instant::now();
        let _ = run(&policy(), "probe", |_| async {
            Err::<(), _>(GatewayError::NetworkUnreachable("dns".into()))
        })
        .await;
        let transient = started.elapsed();

        assert_eq!(cold, Duration::from_millis(2_000));
        assert_eq!(transient, Duration::from_millis(300));
        assert!(cold > transient);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error() {
        let failure = run(&policy(), "predict", |attempt| async move {
            if attempt < 3 {
                Err::<(), _>(GatewayError::ColdStart { status: 503 })
            } else {
                Err(GatewayError::NetworkUnreachable("reset".into()))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.kind, FailureKind::TransientNetwork);
        assert_eq!(failure.last_error, GatewayError::NetworkUnreachable("reset".into()));
        assert!(failure.to_string().contains("predict failed after 3 attempt(s)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let started = Instant::now();

        let failure = run(&policy(), "predict", move |_| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(GatewayError::UnmappedLabel("Unknown-Label".into()))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.kind, FailureKind::NonRetryable);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let mut policy = policy();
        policy.max_attempts = 2;
        policy.request_timeout_ms = 250;
        let started = Instant::now();

        let failure = run(&policy, "probe", |_| async {
            time::sleep(Duration::from_secs(60)).await;
            Ok::<_, GatewayError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(failure.last_error, GatewayError::RequestTimeout(250));
        assert_eq!(failure.attempts, 2);
        // Two timed-out attempts plus one linear backoff of 100ms.
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let mut policy = policy();
        policy.max_attempts = 0;
        let result = run(&policy, "probe", |_| async { Ok::<_, GatewayError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
