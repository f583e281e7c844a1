//! Request validation for inbound webhook deliveries.
//!
//! Checks the declared content type and the required delivery headers
//! before any body parsing happens. Pure functions of their inputs.

use axum::http::HeaderMap;

use crate::error::WebhookError;

/// Header carrying the provider-supplied delivery identifier.
pub const HEADER_DELIVERY: &str = "X-GitHub-Delivery";
/// Header carrying the event name.
pub const HEADER_EVENT: &str = "X-GitHub-Event";
/// Header carrying the HMAC signature of the raw body.
pub const HEADER_SIGNATURE: &str = "X-Hub-Signature-256";

/// Content types the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/json`: the body is the payload.
    Json,
    /// `application/x-www-form-urlencoded`: the payload travels in a
    /// `payload` form field.
    FormUrlEncoded,
}

impl MediaType {
    /// Classify a declared content type. Parameters such as charset are
    /// ignored.
    pub fn parse(content_type: Option<&str>) -> Result<Self, WebhookError> {
        let essence = content_type
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim();
        match essence {
            "application/json" => Ok(MediaType::Json),
            "application/x-www-form-urlencoded" => Ok(MediaType::FormUrlEncoded),
            _ => Err(WebhookError::UnsupportedMediaType),
        }
    }
}

/// Normalized delivery headers.
#[derive(Debug, Clone)]
pub struct DeliveryHeaders {
    pub delivery_id: String,
    pub event: String,
}

/// Validate the declared content type and required headers.
pub fn validate_request(
    content_type: Option<&str>,
    headers: &HeaderMap,
) -> Result<(MediaType, DeliveryHeaders), WebhookError> {
    let media_type = MediaType::parse(content_type)?;
    let delivery_id = require_header(headers, HEADER_DELIVERY)?;
    let event = require_header(headers, HEADER_EVENT)?;
    Ok((media_type, DeliveryHeaders { delivery_id, event }))
}

/// An absent or empty header both count as missing.
fn require_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(WebhookError::MissingHeader(name)),
    }
}
