//! Classification subsystem.
//!
//! # Data Flow
//! ```text
//! ImagePayload
//!     → invoker.rs (preferred endpoint first, rotate on failure)
//!         → upstream client POST, retry executor per endpoint
//!         → normalizer.rs (shape → labels.rs → PredictionResult)
//!     → AllEndpointsExhausted
//!         → simulator.rs (weighted severity, isSimulated = true)
//! ```
//!
//! # Design Decisions
//! - One label table, consumed only by the normalizer and result constructors
//! - Unknown labels are errors, never coerced to a default severity
//! - Simulated results are built through the same constructors as real ones

pub mod invoker;
pub mod labels;
pub mod normalizer;
pub mod simulator;
pub mod types;

pub use invoker::PredictionInvoker;
pub use normalizer::{normalize, RawPredictionResponse};
pub use simulator::FallbackSimulator;
pub use types::{CanonicalSeverity, ImagePayload, PredictionResult};
