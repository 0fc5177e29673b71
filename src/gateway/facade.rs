//! Gateway facade.
//!
//! # Responsibilities
//! - The only entry point the application uses: classify, health, diagnostics
//! - Decide between real classification and the fallback simulator
//! - Feed prediction failures back into the health cache
//!
//! # Design Decisions
//! - `classify` fails only for caller-side image problems
//! - One deadline bounds health resolution plus failover, and it ends
//!   before the inbound request timeout
//! - A degraded gateway answers from the simulator without waiting; with
//!   `ProbeMode::Background` a stale entry triggers one detached probe,
//!   with `ProbeMode::Inline` the caller waits for the probe first
//! - Exhausting every endpoint while the cache says healthy expires the
//!   entry, so the next call probes again

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::time;

use crate::config::{DegradedConfig, GatewayConfig, ProbeMode};
use crate::diagnostics::{DiagnosticReport, DiagnosticsRunner};
use crate::endpoints::{Endpoint, EndpointPool, PoolError};
use crate::error::GatewayResult;
use crate::health::{HealthCache, HealthStatus};
use crate::observability::metrics;
use crate::prediction::{FallbackSimulator, ImagePayload, PredictionInvoker, PredictionResult};
use crate::upstream::UpstreamClient;

/// Errors building a [`Gateway`] from configuration.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Externally visible gateway state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayState {
    Unchecked,
    Probing,
    Healthy { endpoint: String },
    Degraded,
}

impl GatewayState {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayState::Unchecked => "unchecked",
            GatewayState::Probing => "probing",
            GatewayState::Healthy { .. } => "healthy",
            GatewayState::Degraded => "degraded",
        }
    }
}

pub struct Gateway {
    pool: Arc<EndpointPool>,
    health: Arc<HealthCache>,
    invoker: PredictionInvoker,
    simulator: FallbackSimulator,
    rng: Mutex<StdRng>,
    diagnostics: DiagnosticsRunner,
    degraded: DegradedConfig,
    deadline: Duration,
    max_image_bytes: usize,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, InitError> {
        let pool = Arc::new(EndpointPool::new(&config.upstream.endpoints)?);
        let client = UpstreamClient::new(&config.upstream)?;

        let health = Arc::new(HealthCache::new(
            pool.clone(),
            client.clone(),
            config.health_check.retry,
            config.health_check.cache_ttl(),
        ));
        let invoker = PredictionInvoker::new(pool.clone(), client.clone(), config.prediction.retry);
        let diagnostics = DiagnosticsRunner::new(pool.clone(), client, config.diagnostics.clone());

        let rng = match config.simulator.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let failover_worst_case = config.prediction.retry.worst_case() * pool.size() as u32;
        if failover_worst_case > config.prediction.deadline() {
            tracing::warn!(
                failover_worst_case_ms = failover_worst_case.as_millis() as u64,
                deadline_ms = config.prediction.deadline_ms,
                "Full failover can outlast the classification deadline; late endpoints are served by the simulator"
            );
        }

        tracing::info!(
            endpoints = pool.size(),
            primary = %pool.current(),
            cache_ttl_ms = config.health_check.cache_ttl_ms,
            probe_mode = ?config.degraded.probe_mode,
            "Gateway initialized"
        );

        Ok(Self {
            pool,
            health,
            invoker,
            simulator: FallbackSimulator::new(&config.simulator),
            rng: Mutex::new(rng),
            diagnostics,
            degraded: config.degraded.clone(),
            deadline: config.prediction.deadline(),
            max_image_bytes: config.listener.max_body_size,
        })
    }

    /// Classify an image. Downstream unavailability never surfaces as an error.
    ///
    /// Health resolution and failover share one deadline; whatever is still
    /// running when it expires is dropped and the simulator answers.
    pub async fn classify(&self, image: ImagePayload) -> GatewayResult<PredictionResult> {
        image.validate(self.max_image_bytes)?;

        match time::timeout(self.deadline, self.classify_upstream(&image)).await {
            Ok(Some(result)) => return Ok(result),
            Ok(None) => {}
            Err(_) => tracing::warn!(
                deadline_ms = self.deadline.as_millis() as u64,
                "Classification deadline reached, falling back to simulation"
            ),
        }

        Ok(self.simulate())
    }

    /// Cached health, probing first when the entry is stale.
    pub async fn health(&self) -> Arc<HealthStatus> {
        self.health.get().await
    }

    /// Probe every endpoint now. Does not affect routing or the health cache.
    pub async fn run_diagnostics(&self) -> DiagnosticReport {
        self.diagnostics.run_full().await
    }

    pub fn state(&self) -> GatewayState {
        if self.health.is_probing() {
            return GatewayState::Probing;
        }
        let status = self.health.snapshot();
        if !status.is_checked() {
            GatewayState::Unchecked
        } else if status.available {
            GatewayState::Healthy {
                endpoint: status.active_endpoint.clone().unwrap_or_default(),
            }
        } else {
            GatewayState::Degraded
        }
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn health_cache(&self) -> &Arc<HealthCache> {
        &self.health
    }

    async fn classify_upstream(&self, image: &ImagePayload) -> Option<PredictionResult> {
        let status = self.resolve_health().await;

        if status.available {
            let preferred = self.endpoint_named(status.active_endpoint.as_deref());
            match self.invoker.classify(image, preferred.as_ref()).await {
                Ok(result) => return Some(result),
                Err(e) => {
                    tracing::warn!(error = %e, "Healthy gateway could not classify, falling back to simulation");
                    self.health.invalidate(&status);
                }
            }
        } else if self.degraded.attempt_direct {
            match self.invoker.classify(image, None).await {
                Ok(result) => return Some(result),
                Err(e) => tracing::debug!(error = %e, "Direct attempt while degraded failed"),
            }
        }

        None
    }

    async fn resolve_health(&self) -> Arc<HealthStatus> {
        let snapshot = self.health.snapshot();
        if snapshot.is_fresh() {
            return snapshot;
        }

        if snapshot.simulation_active && self.degraded.probe_mode == ProbeMode::Background {
            if !self.health.is_probing() {
                let health = self.health.clone();
                tokio::spawn(async move {
                    health.get().await;
                });
                tracing::debug!("Degraded entry stale, probing in background");
            }
            return snapshot;
        }

        self.health.get().await
    }

    fn endpoint_named(&self, url: Option<&str>) -> Option<Endpoint> {
        let url = url?;
        self.pool.all().iter().find(|e| e.as_str() == url).cloned()
    }

    fn simulate(&self) -> PredictionResult {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        metrics::record_simulated();
        self.simulator.simulate(&mut *rng)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("endpoints", &self.pool.size())
            .field("state", &self.state())
            .finish()
    }
}
