//! Time-boxed health cache.
//!
//! # Responsibilities
//! - Serve the last probe result without network access while it is fresh
//! - Refresh by probing endpoints in rotation order when stale
//! - Remember the last known-good endpoint for the next cycle
//!
//! # Design Decisions
//! - Reads are lock-free snapshots (`ArcSwap`)
//! - Refreshes are serialized by an async mutex and re-check freshness
//!   after acquiring it, so concurrent callers share one probe
//! - A cycle walks a rotation fixed when it starts and writes the pool
//!   once at the end, so a concurrent prediction moving the pool cannot
//!   make it skip or repeat an endpoint
//! - Invalidation is compare-and-swap against the snapshot the caller saw,
//!   so a stale observation never clobbers a fresher probe

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio::sync::Mutex;

use crate::endpoints::{Endpoint, EndpointPool};
use crate::health::status::HealthStatus;
use crate::observability::metrics;
use crate::resilience::{self, Failure, RetryPolicy};
use crate::upstream::UpstreamClient;

/// State owned by whoever holds the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    last_known_good: Option<Endpoint>,
}

/// Shared cache of the inference service's reachability.
pub struct HealthCache {
    pool: Arc<EndpointPool>,
    client: UpstreamClient,
    policy: RetryPolicy,
    ttl: Duration,
    snapshot: ArcSwap<HealthStatus>,
    refresh: Mutex<RefreshState>,
    probing: AtomicBool,
}

impl HealthCache {
    pub fn new(
        pool: Arc<EndpointPool>,
        client: UpstreamClient,
        policy: RetryPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            pool,
            client,
            policy,
            ttl,
            snapshot: ArcSwap::from_pointee(HealthStatus::unchecked(ttl)),
            refresh: Mutex::new(RefreshState::default()),
            probing: AtomicBool::new(false),
        }
    }

    /// Current status without any network access, fresh or not.
    pub fn snapshot(&self) -> Arc<HealthStatus> {
        self.snapshot.load_full()
    }

    /// A refresh cycle is running right now.
    pub fn is_probing(&self) -> bool {
        self.probing.load(Ordering::Acquire)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached status if fresh, otherwise probe and return the new status.
    pub async fn get(&self) -> Arc<HealthStatus> {
        let current = self.snapshot.load_full();
        if current.is_fresh() {
            tracing::debug!(available = current.available, "Health cache hit");
            return current;
        }

        let mut state = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        let current = self.snapshot.load_full();
        if current.is_fresh() {
            return current;
        }

        self.probing.store(true, Ordering::Release);
        let _probing = ProbingGuard(&self.probing);

        let next = Arc::new(self.probe_cycle(&current, &mut state).await);
        self.snapshot.store(next.clone());
        next
    }

    /// Expire `observed` if it is still the cached status.
    ///
    /// Returns false when a newer probe already replaced it.
    pub fn invalidate(&self, observed: &Arc<HealthStatus>) -> bool {
        let expired = Arc::new(observed.expired());
        let previous = self.snapshot.compare_and_swap(observed, expired);
        let swapped = Arc::ptr_eq(&*previous, observed);
        if swapped {
            tracing::info!("Health cache entry invalidated after prediction failure");
        }
        swapped
    }

    async fn probe_cycle(&self, previous: &HealthStatus, state: &mut RefreshState) -> HealthStatus {
        let client = &self.client;
        let mut last_failure: Option<Failure> = None;

        // Order is fixed up front; the pool is written only once the cycle ends.
        let order = self.pool.rotation_from(self.pool.current().position());

        for endpoint in order {
            let target = &endpoint;
            let started = Instant::now();

            let outcome = resilience::run(&self.policy, "health_probe", move |_| client.fetch_info(target)).await;
            metrics::record_probe(endpoint.as_str(), outcome.is_ok(), started.elapsed());

            match outcome {
                Ok(info) => {
                    tracing::info!(
                        endpoint = %endpoint,
                        upstream_simulation = info.upstream_simulation,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Inference service available"
                    );
                    self.pool.reset(&endpoint);
                    state.last_known_good = Some(endpoint.clone());
                    metrics::record_service_available(true);

                    let mut status = HealthStatus::unchecked(self.ttl);
                    status.available = true;
                    status.upstream_simulation = info.upstream_simulation;
                    status.info = Some(info.body);
                    status.active_endpoint = Some(endpoint.to_string());
                    status.stamp();
                    return status;
                }
                Err(failure) => {
                    tracing::warn!(endpoint = %endpoint, error = %failure, "Health probe failed, rotating");
                    last_failure = Some(failure);
                }
            }
        }

        tracing::warn!(
            endpoints = self.pool.size(),
            "No inference endpoint reachable, enabling simulation mode"
        );
        if let Some(good) = &state.last_known_good {
            self.pool.reset(good);
        }
        metrics::record_service_available(false);

        let mut status = HealthStatus::unchecked(self.ttl);
        status.simulation_active = true;
        status.active_endpoint = state.last_known_good.as_ref().map(Endpoint::to_string);
        status.consecutive_failure_count = previous.consecutive_failure_count.saturating_add(1);
        status.last_error = last_failure.map(|f| f.to_string());
        status.stamp();
        status
    }
}

impl std::fmt::Debug for HealthCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCache")
            .field("endpoints", &self.pool.size())
            .field("ttl", &self.ttl)
            .field("probing", &self.is_probing())
            .finish()
    }
}

/// Clears the probing flag even if the refresh future is dropped.
struct ProbingGuard<'a>(&'a AtomicBool);

impl Drop for ProbingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    fn dead_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 5,
            cold_start_delay_ms: 20,
            request_timeout_ms: 500,
        }
    }

    #[tokio::test]
    async fn test_all_dead_enters_simulation_and_wraps_pool() {
        let pool = Arc::new(EndpointPool::new(&[dead_endpoint(), dead_endpoint()]).unwrap());
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let cache = HealthCache::new(pool.clone(), client, fast_policy(), Duration::from_secs(60));

        let status = cache.get().await;
        assert!(!status.available);
        assert!(status.simulation_active);
        assert_eq!(status.consecutive_failure_count, 1);
        assert!(status.active_endpoint.is_none());
        assert!(status.last_error.is_some());
        assert_eq!(pool.current().position(), 0);
        assert!(!cache.is_probing());

        // Fresh degraded entry is served from cache.
        let again = cache.get().await;
        assert!(Arc::ptr_eq(&status, &again));
    }

    #[tokio::test]
    async fn test_invalidate_only_current_snapshot() {
        let pool = Arc::new(EndpointPool::new(&[dead_endpoint()]).unwrap());
        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let cache = HealthCache::new(pool, client, fast_policy(), Duration::from_secs(60));

        let first = cache.get().await;
        assert!(cache.invalidate(&first));
        assert!(!cache.snapshot().is_fresh());
        // The first observation is no longer current.
        assert!(!cache.invalidate(&first));

        let second = cache.get().await;
        assert_eq!(second.consecutive_failure_count, 2);
    }
}
