//! On-demand diagnostics.
//!
//! # Data Flow
//! ```text
//! Operator request
//!     → runner.rs (every endpoint, concurrently, single uncached probe)
//!     → DiagnosticReport (per-endpoint findings + remediation advice)
//! ```
//!
//! # Design Decisions
//! - Off the hot path; exposes raw detail (status, body excerpt, timing)
//! - Read-only: routing state and the health cache are never changed

pub mod runner;

pub use runner::{DiagnosticReport, DiagnosticsRunner, EndpointDiagnostic};
