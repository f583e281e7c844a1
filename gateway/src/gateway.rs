//! End-to-end handling of one inbound webhook delivery.
//!
//! The gateway composes the validator, decoder, signature check, dedup
//! gate, router, and recorder into a per-request state machine that is
//! terminal on first failure:
//!
//! ```text
//! lookup endpoint → validate headers/content-type → decode payload
//!   → [verify signature] → dedup check → route → record → accepted
//! ```
//!
//! Only a fully validated delivery reaches the store.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use tracing::{info, warn};

use crate::decode::decode_payload;
use crate::error::WebhookError;
use crate::route::EventRouter;
use crate::secrets::SecretProvider;
use crate::signature::verify_signature;
use crate::store::{
    DeliveryRecord, DeliveryStore, EndpointStore, InsertOutcome, WebhookEndpoint,
};
use crate::validate::{validate_request, DeliveryHeaders, HEADER_SIGNATURE};

/// Deployment-level protocol choices.
///
/// The provider protocol leaves both of these open; different
/// integrations observed both settings, so they are configuration
/// rather than constants.
#[derive(Debug, Clone, Copy)]
pub struct GatewayPolicy {
    /// The body nests the true payload under the delivery identifier
    /// (`{"<deliveryId>": {...}}`).
    pub delivery_indirection: bool,
    /// Run the duplicate pre-check before routing instead of after.
    pub dedup_before_route: bool,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self {
            delivery_indirection: false,
            dedup_before_route: true,
        }
    }
}

/// Successful outcome of a handled delivery.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub delivery_id: String,
    pub event: String,
    pub action: Option<String>,
}

/// The webhook gateway.
///
/// Holds the store and secret capabilities plus the event router;
/// constructed once by the composition root and shared across requests.
pub struct Gateway {
    endpoints: Arc<dyn EndpointStore>,
    deliveries: Arc<dyn DeliveryStore>,
    secrets: Option<Arc<dyn SecretProvider>>,
    router: EventRouter,
    policy: GatewayPolicy,
}

impl Gateway {
    pub fn new(
        endpoints: Arc<dyn EndpointStore>,
        deliveries: Arc<dyn DeliveryStore>,
        router: EventRouter,
        policy: GatewayPolicy,
    ) -> Self {
        Self {
            endpoints,
            deliveries,
            secrets: None,
            router,
            policy,
        }
    }

    /// Attach a secret provider for endpoints that validate deliveries.
    pub fn with_secret_provider(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Handle one inbound delivery addressed to `public_id`.
    pub async fn handle(
        &self,
        public_id: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Accepted, WebhookError> {
        let endpoint = self
            .endpoints
            .find_enabled(public_id)
            .await?
            .ok_or(WebhookError::EndpointNotFound)?;

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let (media_type, delivery) = validate_request(content_type, headers)?;

        info!(
            public_id,
            delivery_id = %delivery.delivery_id,
            event = %delivery.event,
            "webhook_received"
        );

        let expected_delivery_id = self
            .policy
            .delivery_indirection
            .then_some(delivery.delivery_id.as_str());
        let payload = decode_payload(body, media_type, expected_delivery_id)?;

        if endpoint.validate_deliveries {
            self.verify_signature(&endpoint, headers, body).await?;
        }

        if self.policy.dedup_before_route {
            self.check_duplicate(&endpoint, &delivery.delivery_id).await?;
        }

        let routed = self.router.dispatch(&delivery.event, &payload)?;

        if !self.policy.dedup_before_route {
            self.check_duplicate(&endpoint, &delivery.delivery_id).await?;
        }

        self.record(&endpoint, &delivery, routed.action.clone(), payload)
            .await?;

        info!(
            public_id,
            delivery_id = %delivery.delivery_id,
            event = %delivery.event,
            action = ?routed.action,
            "delivery_recorded"
        );

        Ok(Accepted {
            delivery_id: delivery.delivery_id,
            event: delivery.event,
            action: routed.action,
        })
    }

    async fn verify_signature(
        &self,
        endpoint: &WebhookEndpoint,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), WebhookError> {
        let Some(secrets) = &self.secrets else {
            // Policy demands verification but no provider was wired in.
            // Reject rather than accept unverified deliveries.
            warn!(public_id = %endpoint.public_id, "signature_provider_missing");
            return Err(WebhookError::InvalidSignature);
        };

        let header = headers
            .get(HEADER_SIGNATURE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let keys = secrets.signing_keys(&endpoint.id).await;

        if !verify_signature(body, header, &keys) {
            warn!(public_id = %endpoint.public_id, "signature_invalid");
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Dedup gate. A pre-check only: the recorder's atomic insert is the
    /// authority when identical deliveries race.
    async fn check_duplicate(
        &self,
        endpoint: &WebhookEndpoint,
        delivery_id: &str,
    ) -> Result<(), WebhookError> {
        if !endpoint.disallow_duplicate_deliveries {
            return Ok(());
        }
        if self.deliveries.exists(&endpoint.id, delivery_id).await? {
            warn!(
                public_id = %endpoint.public_id,
                delivery_id,
                "duplicate_delivery"
            );
            return Err(WebhookError::DuplicateDelivery);
        }
        Ok(())
    }

    async fn record(
        &self,
        endpoint: &WebhookEndpoint,
        delivery: &DeliveryHeaders,
        action: Option<String>,
        payload: serde_json::Value,
    ) -> Result<(), WebhookError> {
        let record = DeliveryRecord::new(
            endpoint.id.clone(),
            delivery.delivery_id.clone(),
            delivery.event.clone(),
            action,
            payload,
        );

        if endpoint.disallow_duplicate_deliveries {
            match self.deliveries.insert_if_absent(record).await? {
                InsertOutcome::Inserted => Ok(()),
                InsertOutcome::AlreadyExists => {
                    // Lost a race against a concurrent identical delivery.
                    warn!(
                        public_id = %endpoint.public_id,
                        delivery_id = %delivery.delivery_id,
                        "duplicate_delivery_on_insert"
                    );
                    Err(WebhookError::DuplicateDelivery)
                }
            }
        } else {
            self.deliveries.insert(record).await?;
            Ok(())
        }
    }
}
