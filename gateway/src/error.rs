//! Error types for webhook delivery handling.
//!
//! Every variant is terminal: no stage retries or recovers from another
//! stage's failure. The HTTP layer maps each variant to exactly one
//! status code and message, and renders failures as
//! `{"error": {"code": <int>, "message": <string>}}` with `code`
//! mirroring the status. Not-found is the one exception: it responds
//! with a bare 404 so a disabled endpoint is indistinguishable from an
//! absent one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while handling a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Endpoint is unknown or disabled.
    #[error("webhook endpoint not found")]
    EndpointNotFound,

    #[error("Unsupported media type")]
    UnsupportedMediaType,

    /// A required delivery header is absent or empty.
    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Invalid URL-encoded payload")]
    InvalidEncodedPayload,

    #[error("Invalid JSON payload")]
    InvalidJson,

    /// The delivery-id indirection is enabled and the payload has no
    /// entry under the supplied delivery identifier.
    #[error("X-GitHub-Delivery header must match payload")]
    DeliveryIdMismatch,

    #[error("Duplicate delivery")]
    DuplicateDelivery,

    #[error("Unsupported event")]
    UnsupportedEvent,

    #[error("Unsupported action")]
    UnsupportedAction,

    #[error("Invalid signature")]
    InvalidSignature,

    /// A store operation failed. The detail stays in the logs; the
    /// client sees a generic server error.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl WebhookError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::EndpointNotFound => StatusCode::NOT_FOUND,
            WebhookError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidEncodedPayload
            | WebhookError::InvalidJson
            | WebhookError::DeliveryIdMismatch
            | WebhookError::DuplicateDelivery
            | WebhookError::UnsupportedEvent
            | WebhookError::UnsupportedAction => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-visible message.
    fn public_message(&self) -> String {
        match self {
            WebhookError::StoreUnavailable(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            return status.into_response();
        }
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.public_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
