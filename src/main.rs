//! Retina prediction gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                      GATEWAY                             │
//!   Application   │  ┌────────┐    ┌─────────┐    ┌──────────────┐           │
//!   ──────────────┼─▶│  http  │───▶│ gateway │───▶│ health cache │──┐        │
//!                 │  │ server │    │ facade  │    └──────────────┘  │        │
//!                 │  └────────┘    └────┬────┘                      ▼        │
//!                 │                     │         ┌──────────────────────┐   │   Inference
//!                 │                     ├────────▶│ prediction invoker   │◀──┼──▶ endpoints
//!                 │                     │         │ + endpoint pool      │   │   (primary,
//!                 │                     │         │ + retry executor     │   │    fallbacks)
//!                 │                     │         └──────────┬───────────┘   │
//!                 │                     │                    ▼             │
//!                 │                     │         ┌──────────────────────┐   │
//!   ◀─────────────┼─────────────────────┴─────────│ normalizer/simulator │   │
//!   PredictionResult                              └──────────────────────┘   │
//!                 │                                                          │
//!                 │  config · observability · lifecycle · diagnostics        │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use retina_gateway::config::{self, GatewayConfig};
use retina_gateway::lifecycle::startup;
use retina_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "retina-gateway")]
#[command(about = "Resilient prediction gateway for the retina inference service", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inference endpoint base URL, primary first; replaces the configured list
    #[arg(short, long = "endpoint")]
    endpoints: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };
    if !args.endpoints.is_empty() {
        config.upstream.endpoints = args.endpoints;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    logging::init(&config.observability.log_level)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        endpoints = ?config.upstream.endpoints,
        "retina-gateway starting"
    );

    startup::run(config).await
}
