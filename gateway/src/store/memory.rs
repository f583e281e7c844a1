//! In-memory store implementation.
//!
//! Backs the default binary wiring and the tests. A single mutex guards
//! the delivery map, which makes `insert_if_absent` atomic with respect
//! to concurrent deliveries carrying the same identifier.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    DeliveryRecord, DeliveryStore, EndpointId, EndpointStore, InsertOutcome, StoreError,
    WebhookEndpoint,
};

type DeliveryKey = (EndpointId, String);

/// In-memory endpoint and delivery store.
#[derive(Default)]
pub struct MemoryStore {
    endpoints: Mutex<HashMap<String, WebhookEndpoint>>,
    deliveries: Mutex<HashMap<DeliveryKey, Vec<DeliveryRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the given endpoints, keyed by public id.
    pub fn with_endpoints(endpoints: Vec<WebhookEndpoint>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|e| (e.public_id.clone(), e))
            .collect();
        Self {
            endpoints: Mutex::new(endpoints),
            deliveries: Mutex::new(HashMap::new()),
        }
    }

    /// Register an endpoint under its public id.
    pub async fn add_endpoint(&self, endpoint: WebhookEndpoint) {
        self.endpoints
            .lock()
            .await
            .insert(endpoint.public_id.clone(), endpoint);
    }
}

#[async_trait]
impl EndpointStore for MemoryStore {
    async fn find_enabled(&self, public_id: &str) -> Result<Option<WebhookEndpoint>, StoreError> {
        let endpoints = self.endpoints.lock().await;
        Ok(endpoints.get(public_id).filter(|e| e.enabled).cloned())
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn exists(
        &self,
        webhook_id: &EndpointId,
        delivery_id: &str,
    ) -> Result<bool, StoreError> {
        let deliveries = self.deliveries.lock().await;
        let key = (webhook_id.clone(), delivery_id.to_string());
        Ok(deliveries.get(&key).is_some_and(|records| !records.is_empty()))
    }

    async fn insert_if_absent(&self, record: DeliveryRecord) -> Result<InsertOutcome, StoreError> {
        let mut deliveries = self.deliveries.lock().await;
        let key = (record.webhook_id.clone(), record.delivery_id.clone());
        let records = deliveries.entry(key).or_default();
        if !records.is_empty() {
            return Ok(InsertOutcome::AlreadyExists);
        }
        debug!(delivery_id = %record.delivery_id, "delivery_inserted");
        records.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn insert(&self, record: DeliveryRecord) -> Result<(), StoreError> {
        let mut deliveries = self.deliveries.lock().await;
        let key = (record.webhook_id.clone(), record.delivery_id.clone());
        deliveries.entry(key).or_default().push(record);
        Ok(())
    }

    async fn get(
        &self,
        webhook_id: &EndpointId,
        delivery_id: &str,
    ) -> Result<Option<DeliveryRecord>, StoreError> {
        let deliveries = self.deliveries.lock().await;
        let key = (webhook_id.clone(), delivery_id.to_string());
        Ok(deliveries
            .get(&key)
            .and_then(|records| records.first())
            .cloned())
    }
}
