//! Main entry point for the RGASS relay server.
//!
//! This binary relays RGASS operations between WebSocket clients using the
//! Axum web framework.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crdt_rgass::server::{Hub, ServerConfig, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    info!("Starting RGASS relay server...");

    let hub = Arc::new(Hub::new(config.session, config.broadcast_capacity));
    let app = create_router(hub);

    info!("Server listening on http://{}", config.addr);
    info!("Available endpoints:");
    info!("  GET /health - Health check");
    info!("  GET /text   - Current document text");
    info!("  GET /ws     - WebSocket editing session");

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
