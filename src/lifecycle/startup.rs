//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics, startup health probe)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The startup probe never delays the listener; until it finishes the
//!   first request probes inline
//! - Listeners start last (traffic only when ready)

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Run the gateway until a shutdown signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let gateway = Arc::new(Gateway::new(&config)?);

    if config.health_check.startup_probe {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let status = gateway.health().await;
            if status.available {
                tracing::info!(endpoint = ?status.active_endpoint, "Startup probe succeeded");
            } else {
                tracing::warn!(
                    error = ?status.last_error,
                    "Startup probe failed, serving simulated predictions until an endpoint recovers"
                );
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        max_body_size = config.listener.max_body_size,
        request_timeout_secs = config.listener.request_timeout_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::spawn_listener(shutdown.clone());

    let server = HttpServer::new(gateway, &config.listener);
    server.run(listener, shutdown.subscribe()).await?;

    if !shutdown.is_triggered() {
        tracing::warn!("HTTP server stopped without a shutdown signal");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
