//! Prediction invoker.
//!
//! # Responsibilities
//! - Start at the preferred endpoint, or the pool's current one
//! - Run each endpoint under the prediction retry policy
//! - Rotate once through the pool; never cycle indefinitely
//!
//! An attempt is request + parse + normalize, so a malformed body or an
//! unmapped label fails that endpoint (non-retryable) and moves on to the
//! next one instead of retrying the same endpoint.

use std::sync::Arc;
use std::time::Instant;

use crate::endpoints::{Endpoint, EndpointPool};
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::prediction::normalizer;
use crate::prediction::types::{ImagePayload, PredictionResult};
use crate::resilience::{self, RetryPolicy};
use crate::upstream::UpstreamClient;

#[derive(Debug, Clone)]
pub struct PredictionInvoker {
    pool: Arc<EndpointPool>,
    client: UpstreamClient,
    policy: RetryPolicy,
}

impl PredictionInvoker {
    pub fn new(pool: Arc<EndpointPool>, client: UpstreamClient, policy: RetryPolicy) -> Self {
        Self { pool, client, policy }
    }

    /// Classify `image`, trying every endpoint at most once (each under the retry policy).
    ///
    /// Returns [`GatewayError::AllEndpointsExhausted`] when none succeeded.
    /// The endpoint that answered becomes the pool's current endpoint.
    pub async fn classify(
        &self,
        image: &ImagePayload,
        preferred: Option<&Endpoint>,
    ) -> GatewayResult<PredictionResult> {
        let start = match preferred {
            Some(endpoint) => endpoint.position(),
            None => self.pool.current().position(),
        };
        let order = self.pool.rotation_from(start);
        let client = &self.client;

        for endpoint in &order {
            let started = Instant::now();
            let outcome = resilience::run(&self.policy, "predict", move |_| async move {
                let body = client.predict(endpoint, image).await?;
                normalizer::normalize_body(&body, endpoint)
            })
            .await;

            match outcome {
                Ok(result) => {
                    metrics::record_prediction(endpoint.as_str(), "ok", started.elapsed());
                    if self.pool.current() != *endpoint {
                        self.pool.reset(endpoint);
                    }
                    tracing::info!(
                        endpoint = %endpoint,
                        severity = %result.severity_label(),
                        confidence = result.confidence(),
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Prediction completed"
                    );
                    return Ok(result);
                }
                Err(failure) => {
                    metrics::record_prediction(endpoint.as_str(), failure.last_error.code(), started.elapsed());
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempts = failure.attempts,
                        error = %failure.last_error,
                        "Prediction failed on endpoint, rotating"
                    );
                }
            }
        }

        Err(GatewayError::AllEndpointsExhausted { tried: order.len() })
    }
}
