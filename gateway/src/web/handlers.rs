//! Webhook endpoint handlers.
//!
//! The handlers stay thin: they hand the raw body and headers to the
//! gateway and translate its outcome into an HTTP response. All
//! protocol logic lives in the gateway and its stages.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::gateway::Gateway;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Index page for the webhooks path family. A simple liveness string.
pub async fn index() -> &'static str {
    "Hello, world. You're at the webhooks index."
}

/// Accepted-delivery response body.
#[derive(Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

/// GitHub webhook endpoint.
///
/// Runs the full delivery state machine and responds 202 on success.
/// Failures map to the protocol's fixed status/message table; endpoint
/// lookup failures are a bare 404.
pub async fn handle_github_webhook(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    match state.gateway.handle(&public_id, &headers, &body).await {
        Ok(accepted) => {
            info!(
                public_id = %public_id,
                delivery_id = %accepted.delivery_id,
                event = %accepted.event,
                "webhook_accepted"
            );
            (
                StatusCode::ACCEPTED,
                Json(AcceptedResponse { status: "accepted" }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(public_id = %public_id, error = %err, "webhook_rejected");
            err.into_response()
        }
    }
}
