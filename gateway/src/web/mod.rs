//! Web server module for handling inbound webhook deliveries.
//!
//! Exposes the gateway over HTTP:
//! - `POST /webhooks/github/:public_id/handle` — the delivery endpoint
//! - `GET /webhooks/` — liveness string for the webhooks path family
//! - `GET /health` — health check

pub mod handlers;

pub use handlers::{
    handle_github_webhook, health, index, AcceptedResponse, AppState, HealthResponse,
};

use tower_http::trace::TraceLayer;

/// Builds the axum Router with all endpoints.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/health", get(health))
        .route("/webhooks/", get(index))
        .route("/webhooks/github/:public_id/handle", post(handle_github_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
