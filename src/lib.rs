//! Resilient prediction gateway for a retina-image inference service.
//!
//! Sits between the application and one or more inference endpoints and
//! always returns a usable classification: failover across endpoints,
//! cold-start aware retries, a time-boxed health cache, and a clearly
//! flagged simulated fallback when nothing upstream can answer.

// Core
pub mod config;
pub mod error;
pub mod gateway;

// Upstream access
pub mod endpoints;
pub mod health;
pub mod prediction;
pub mod upstream;

// Operations
pub mod diagnostics;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, GatewayState};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use prediction::{CanonicalSeverity, ImagePayload, PredictionResult};
