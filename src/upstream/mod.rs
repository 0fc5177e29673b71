//! Inference service boundary.
//!
//! # Upstream Contract
//! ```text
//! GET  {base}/            → { status | service, model_name?, classes?,
//!                             api_version?, simulation_mode_enabled? }
//! POST {base}/predict     → multipart "file"
//!                         ← { class, confidence } or
//!                           { severity, severity_level, confidence,
//!                             recommendation?, raw_prediction? }
//! ```
//!
//! # Design Decisions
//! - 502/503/504 are cold starts, not hard failures
//! - The client never retries; that is the executor's job

pub mod client;

pub use client::{RawReply, UpstreamClient};
