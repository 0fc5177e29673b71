//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, span)
//!     → handlers.rs (multipart → ImagePayload → Gateway)
//!     → response.rs (caller errors → 4xx JSON)
//!     → Send to client
//! ```
//!
//! Routes:
//! - `POST /api/predict`: multipart image under `file` → PredictionResult
//! - `GET /api/health`: cached HealthStatus; `?full_test=true` adds diagnostics
//! - `GET /api/diagnostics`: DiagnosticReport
//!
//! A client disconnect or the request timeout drops the handler future,
//! which cancels the in-flight upstream call and any pending retry.

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
