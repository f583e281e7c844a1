//! GitGate Web Server - webhook delivery gateway.
//!
//! Wires configuration, the in-memory stores, the event router, and the
//! optional signing keyring into an axum server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gitgate::web::build_router;
use gitgate::{AppState, Config, EventRouter, Gateway, MemoryStore, WebhookEndpoint};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        delivery_indirection = config.delivery_indirection,
        dedup_before_route = config.dedup_before_route,
        signing_key_configured = config.signing_key.is_some(),
        fixtures = ?config.fixtures_path,
        "config_loaded"
    );

    // Create the store, preloading endpoint fixtures if configured
    let store = Arc::new(match &config.fixtures_path {
        Some(path) => {
            let endpoints = load_fixtures(path)?;
            info!(path = %path, count = endpoints.len(), "fixtures_loaded");
            MemoryStore::with_endpoints(endpoints)
        }
        None => MemoryStore::new(),
    });

    // Assemble the gateway
    let mut gateway = Gateway::new(
        store.clone(),
        store.clone(),
        EventRouter::with_default_routes(),
        config.policy(),
    );
    if let Some(keyring) = config.keyring() {
        gateway = gateway.with_secret_provider(Arc::new(keyring));
        info!("signing_keyring_configured");
    }

    // Build the router
    let app = build_router(AppState::new(gateway));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Read a JSON array of webhook endpoints from a fixtures file.
fn load_fixtures(path: &str) -> Result<Vec<WebhookEndpoint>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {path}"))
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

    info!("gateway_shutting_down");
}
