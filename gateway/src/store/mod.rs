//! Store capabilities consumed by the webhook gateway.
//!
//! The gateway does not own persistence. It consumes two narrow
//! capabilities: an [`EndpointStore`] to resolve inbound public ids to
//! configured endpoints, and a [`DeliveryStore`] to record accepted
//! deliveries. The [`MemoryStore`] implementation backs the default
//! binary wiring and the tests; a production deployment substitutes its
//! own database-backed implementations.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Internal identifier of a configured endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub i64);

/// A configured webhook receiver.
///
/// Read-only to the delivery path; provisioning happens elsewhere. A
/// disabled endpoint is reported as absent by [`EndpointStore`] so that
/// callers cannot distinguish disabled from unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: EndpointId,
    /// Opaque, URL-safe identifier used in the inbound path.
    pub public_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// When true, the gateway must verify the delivery signature before
    /// accepting.
    #[serde(default)]
    pub validate_deliveries: bool,
    /// When true, a previously accepted delivery id for this endpoint is
    /// rejected.
    #[serde(default)]
    pub disallow_duplicate_deliveries: bool,
}

fn default_enabled() -> bool {
    true
}

/// One accepted delivery, stored verbatim for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub webhook_id: EndpointId,
    /// Provider-supplied delivery identifier.
    pub delivery_id: String,
    pub event: String,
    pub action: Option<String>,
    /// The decoded JSON body, unmodified.
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn new(
        webhook_id: EndpointId,
        delivery_id: String,
        event: String,
        action: Option<String>,
        payload: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            webhook_id,
            delivery_id,
            event,
            action,
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of an atomic insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// A failed store operation.
///
/// Surfaced to the client as a generic server error and never retried:
/// retrying an insert could silently double-process a delivery.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Lookup capability for configured endpoints.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Find an enabled endpoint by its public identifier.
    ///
    /// Disabled endpoints are reported as `None`.
    async fn find_enabled(&self, public_id: &str) -> Result<Option<WebhookEndpoint>, StoreError>;
}

/// Persistence capability for accepted deliveries.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Whether a delivery with this identifier has already been recorded
    /// for the endpoint.
    ///
    /// A pre-check optimization only: [`DeliveryStore::insert_if_absent`]
    /// is the authority when identical deliveries race.
    async fn exists(&self, webhook_id: &EndpointId, delivery_id: &str)
        -> Result<bool, StoreError>;

    /// Atomically insert the record unless one already exists for the
    /// same `(webhook_id, delivery_id)`.
    ///
    /// Of two concurrent calls with the same key, exactly one observes
    /// [`InsertOutcome::Inserted`].
    async fn insert_if_absent(&self, record: DeliveryRecord) -> Result<InsertOutcome, StoreError>;

    /// Insert unconditionally. Used for endpoints that allow duplicate
    /// deliveries.
    async fn insert(&self, record: DeliveryRecord) -> Result<(), StoreError>;

    /// Fetch the earliest recorded delivery for `(webhook_id, delivery_id)`.
    async fn get(
        &self,
        webhook_id: &EndpointId,
        delivery_id: &str,
    ) -> Result<Option<DeliveryRecord>, StoreError>;
}
