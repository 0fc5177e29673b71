//! Application-facing facade.
//!
//! # Data Flow
//! ```text
//! classify(image)
//!     → validate image (only caller errors surface)
//!     → health cache (fresh? use it; stale? probe or defer)
//!     → healthy: prediction invoker → PredictionResult
//!     → exhausted or degraded: fallback simulator → PredictionResult
//! ```
//!
//! # Design Decisions
//! - Always returns a usable result; simulated ones are flagged
//! - Owns every subsystem; callers hold an `Arc<Gateway>`

pub mod facade;

pub use facade::{Gateway, GatewayState, InitError};
