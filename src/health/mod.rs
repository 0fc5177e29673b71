//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway asks for health:
//!     → cache.rs (fresh snapshot? return it, no network)
//!     → stale: probe current endpoint through the retry executor
//!     → failure: advance pool, probe next, until each tried once
//!     → status.rs (HealthStatus stored as new snapshot)
//! ```
//!
//! # Design Decisions
//! - A 200 with an unrecognized body counts as unavailable
//! - One probe per TTL window, however many callers ask
//! - Health state is for the service as a whole, pinned to one endpoint

pub mod cache;
pub mod status;

pub use cache::HealthCache;
pub use status::{HealthStatus, InfoResponse, ProbeRules};
