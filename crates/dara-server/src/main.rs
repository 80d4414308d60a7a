// crates/dara-server/src/main.rs
// ============================================================================
// Module: Dara Control Plane Entry Point
// Description: Binary wiring configuration, components, and the listener.
// Purpose: Serve the control-plane HTTP API.
// Dependencies: dara-config, dara-server, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! Reads the environment configuration, assembles the component graph, and
//! serves the API until the process is stopped. Logging goes through
//! `tracing` with an env-filter (`RUST_LOG`), defaulting to `info`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;

use dara_config::ControlPlaneConfig;
use dara_server::ServerError;
use dara_server::build_router;
use dara_server::build_state;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "control plane failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds the component graph and serves the API.
async fn run() -> Result<(), ServerError> {
    let config = ControlPlaneConfig::from_env()?;
    let state = build_state(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "dara control plane listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
