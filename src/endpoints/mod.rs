//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! config.upstream.endpoints (primary first, then fallbacks)
//!     → pool.rs (validated once at startup, immutable)
//!     → current() for the hot path
//!     → rotation_from() for one pass over every endpoint
//!     → advance() on failure, reset() to pin a known-good endpoint
//! ```
//!
//! # Design Decisions
//! - Only the position pointer mutates; it is a single atomic
//! - An empty pool is a startup error, never a runtime condition

pub mod pool;

pub use pool::{Endpoint, EndpointPool, PoolError};
