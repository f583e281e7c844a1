//! GitGate - gateway for GitHub webhook deliveries.
//!
//! Receives externally-triggered webhook deliveries, validates them,
//! prevents duplicate processing, and routes them to event/action
//! handlers. Persistence and signing secrets are consumed as
//! capabilities; the crate ships in-memory implementations for the
//! default wiring and the tests.
//!
//! ## Architecture
//!
//! ```text
//! Request → Gateway → Validator → Decoder → [Signature] → Dedup Gate
//!                                           → Router → Recorder → 202
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod route;
pub mod secrets;
pub mod signature;
pub mod store;
pub mod validate;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::WebhookError;
pub use gateway::{Accepted, Gateway, GatewayPolicy};
pub use route::{EventRouter, InstallationAction};
pub use secrets::{Keyring, SecretProvider, SigningKey};
pub use store::{
    DeliveryRecord, DeliveryStore, EndpointStore, MemoryStore, WebhookEndpoint,
};
pub use web::{build_router, AppState};
