//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → command-line endpoint overrides applied by the binary
//!     → handed to Gateway::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DegradedConfig, DiagnosticsConfig, GatewayConfig, HealthCheckConfig, ListenerConfig,
    ObservabilityConfig, PredictionConfig, ProbeMode, SimulatorConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
