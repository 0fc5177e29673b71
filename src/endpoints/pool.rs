//! Endpoint pool.
//!
//! # Responsibilities
//! - Hold the ordered, immutable list of inference base URLs
//! - Track the current position (the only mutable state)
//! - Produce rotation orders for failover

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use url::Url;

/// A single candidate base URL for the inference service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: Url,
    position: usize,
}

impl Endpoint {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Index of this endpoint in the configured list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Base URL without a trailing slash, as shown to operators.
    pub fn as_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Resolve `path` (e.g. "/predict") against the base URL, keeping any
    /// path prefix the base URL carries.
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Endpoint pool is empty")]
    Empty,

    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Ordered list of endpoints with a rotating "current" pointer.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    current: AtomicUsize,
}

impl EndpointPool {
    /// Build a pool from base URLs. The first URL is the primary.
    pub fn new<S: AsRef<str>>(urls: &[S]) -> Result<Self, PoolError> {
        if urls.is_empty() {
            return Err(PoolError::Empty);
        }

        let endpoints = urls
            .iter()
            .enumerate()
            .map(|(position, raw)| {
                let raw = raw.as_ref();
                let base_url = parse_base_url(raw)?;
                Ok(Endpoint { base_url, position })
            })
            .collect::<Result<Vec<_>, PoolError>>()?;

        Ok(Self {
            endpoints,
            current: AtomicUsize::new(0),
        })
    }

    pub fn size(&self) -> usize {
        self.endpoints.len()
    }

    /// The currently selected endpoint.
    pub fn current(&self) -> Endpoint {
        let idx = self.current.load(Ordering::Acquire) % self.endpoints.len();
        self.endpoints[idx].clone()
    }

    /// Rotate to the next endpoint, wrapping at the end of the list.
    pub fn advance(&self) -> Endpoint {
        let len = self.endpoints.len();
        let prev = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        let next = &self.endpoints[(prev + 1) % len];
        tracing::info!(endpoint = %next, position = next.position, "Switched to next inference endpoint");
        next.clone()
    }

    /// Pin the pool to a known-good endpoint. Endpoints from another pool are ignored.
    pub fn reset(&self, to: &Endpoint) {
        match self.endpoints.get(to.position) {
            Some(e) if e == to => self.current.store(to.position, Ordering::Release),
            _ => tracing::warn!(endpoint = %to, "Ignoring reset to endpoint outside the pool"),
        }
    }

    /// Every endpoint in configured order.
    pub fn all(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Every endpoint once, starting at `start` and wrapping around.
    pub fn rotation_from(&self, start: usize) -> Vec<Endpoint> {
        let len = self.endpoints.len();
        (0..len)
            .map(|i| self.endpoints[(start + i) % len].clone())
            .collect()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, PoolError> {
    let invalid = |reason: String| PoolError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> EndpointPool {
        EndpointPool::new(&["http://a.test", "http://b.test", "http://c.test"]).unwrap()
    }

    #[test]
    fn test_rotation_wraps() {
        let pool = pool();
        assert_eq!(pool.current().as_str(), "http://a.test");
        assert_eq!(pool.advance().as_str(), "http://b.test");
        assert_eq!(pool.advance().as_str(), "http://c.test");
        assert_eq!(pool.advance().as_str(), "http://a.test");
        assert_eq!(pool.current().position(), 0);
    }

    #[test]
    fn test_full_cycle_visits_each_once() {
        let pool = pool();
        let mut seen = vec![pool.current().position()];
        for _ in 1..pool.size() {
            seen.push(pool.advance().position());
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(pool.advance().position(), 0);
    }

    #[test]
    fn test_reset_pins_endpoint() {
        let pool = pool();
        let c = pool.all()[2].clone();
        pool.reset(&c);
        assert_eq!(pool.current(), c);

        let foreign = EndpointPool::new(&["http://other.test"]).unwrap().current();
        pool.reset(&foreign);
        assert_eq!(pool.current(), c);
    }

    #[test]
    fn test_rotation_from() {
        let pool = pool();
        let order: Vec<_> = pool.rotation_from(1).iter().map(|e| e.position()).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_construction_errors() {
        let empty: [&str; 0] = [];
        assert_eq!(EndpointPool::new(&empty).unwrap_err(), PoolError::Empty);
        assert!(matches!(
            EndpointPool::new(&["ftp://a.test"]).unwrap_err(),
            PoolError::InvalidUrl { .. }
        ));
        assert!(matches!(
            EndpointPool::new(&["not a url"]).unwrap_err(),
            PoolError::InvalidUrl { .. }
        ));
    }

    #[test]
    fn test_url_for_keeps_prefix() {
        let pool = EndpointPool::new(&["http://host.test/ml/"]).unwrap();
        assert_eq!(pool.current().url_for("/predict").as_str(), "http://host.test/ml/predict");
        let pool = EndpointPool::new(&["http://host.test"]).unwrap();
        assert_eq!(pool.current().url_for("/").as_str(), "http://host.test/");
    }
}
