//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to inference service:
//!     → executor.rs (per-attempt timeout, attempt cap)
//!     → On failure: classify (cold start / transient / non-retryable)
//!     → backoff.rs (fixed cold-start wait or linear backoff)
//!     → Exhausted: Failure { kind, attempts, last_error }
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - One executor shared by health probes and predictions, parameterized by policy
//! - Schema mismatches are not retried; they cannot fix themselves

pub mod backoff;
pub mod executor;
pub mod policy;

pub use executor::{run, Failure, FailureKind};
pub use policy::RetryPolicy;
