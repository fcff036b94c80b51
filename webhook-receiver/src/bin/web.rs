//! Storehook Web Server - product webhook receiver.
//!
//! This binary:
//! - Receives product event webhooks from the catalog service
//! - Verifies the HMAC-SHA256 signature over the raw body
//! - Logs the event and acknowledges it, or rejects it with 401
//!
//! Without `WEBHOOK_SECRET` the server runs with verification disabled until
//! a secret is supplied through `POST /set-secret`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storehook::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_secret_configured = config.secret_configured(),
        admin_token_configured = config.admin_token.is_some(),
        body_limit_bytes = config.body_limit_bytes,
        "config_loaded"
    );

    if !config.secret_configured() {
        warn!(
            hint = "set WEBHOOK_SECRET or POST {\"secret\": \"...\"} to /set-secret",
            "signature_verification_disabled"
        );
    }

    if config.admin_token.is_none() {
        warn!("set_secret_endpoint_unauthenticated");
    }

    let port = config.port;
    let app = router(AppState::new(config));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(
        address = %addr,
        webhook_endpoint = "/webhooks/products",
        "web_server_listening"
    );

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
