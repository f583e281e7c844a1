//! Table-driven dispatch from (event, action) pairs to handler slots.
//!
//! Events and actions arrive as raw strings but are classified into
//! closed enums with an explicit unknown variant before dispatch. The
//! router's job is classification and extensibility: recognized pairs
//! map to handler slots that are no-ops until the embedding application
//! registers real handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::WebhookError;

/// Webhook event families the gateway recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Installation,
    Unknown(String),
}

impl Event {
    pub fn parse(name: &str) -> Self {
        match name {
            "installation" => Event::Installation,
            other => Event::Unknown(other.to_string()),
        }
    }
}

/// Sub-actions of the `installation` event family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstallationAction {
    Created,
    Deleted,
    NewPermissionsAccepted,
    Suspend,
    Unsuspend,
    /// Anything else, including payloads with no `action` field at all.
    /// An absent action is a routable value, not a missing-field error.
    Unknown(Option<String>),
}

impl InstallationAction {
    pub fn parse(action: Option<&str>) -> Self {
        match action {
            Some("created") => InstallationAction::Created,
            Some("deleted") => InstallationAction::Deleted,
            Some("new_permissions_accepted") => InstallationAction::NewPermissionsAccepted,
            Some("suspend") => InstallationAction::Suspend,
            Some("unsuspend") => InstallationAction::Unsuspend,
            other => InstallationAction::Unknown(other.map(str::to_string)),
        }
    }

    const RECOGNIZED: [InstallationAction; 5] = [
        InstallationAction::Created,
        InstallationAction::Deleted,
        InstallationAction::NewPermissionsAccepted,
        InstallationAction::Suspend,
        InstallationAction::Unsuspend,
    ];
}

/// A registered handler slot. Handlers receive the decoded payload;
/// business logic is injected by the embedding application.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// What the router learned about a dispatched delivery.
#[derive(Debug, Clone)]
pub struct Routed {
    /// The raw `action` string from the payload, if present.
    pub action: Option<String>,
}

/// Two-level dispatcher: first by event family, then by action.
pub struct EventRouter {
    installation: HashMap<InstallationAction, Handler>,
}

impl EventRouter {
    /// Router with a no-op slot for every recognized installation action.
    pub fn with_default_routes() -> Self {
        let noop: Handler = Arc::new(|_payload| {});
        let installation = InstallationAction::RECOGNIZED
            .iter()
            .map(|action| (action.clone(), noop.clone()))
            .collect();
        Self { installation }
    }

    /// Replace the handler slot for an installation action.
    ///
    /// Registering an `Unknown` action has no effect on dispatch:
    /// unrecognized actions are always rejected.
    pub fn on_installation(&mut self, action: InstallationAction, handler: Handler) {
        self.installation.insert(action, handler);
    }

    /// Classify and dispatch one decoded delivery.
    pub fn dispatch(&self, event: &str, payload: &Value) -> Result<Routed, WebhookError> {
        match Event::parse(event) {
            Event::Unknown(name) => {
                debug!(event = %name, "unsupported_event");
                Err(WebhookError::UnsupportedEvent)
            }
            Event::Installation => {
                let action = payload.get("action").and_then(Value::as_str);
                match self.installation.get(&InstallationAction::parse(action)) {
                    Some(handler) => {
                        debug!(event, action = ?action, "delivery_routed");
                        handler(payload);
                        Ok(Routed {
                            action: action.map(str::to_string),
                        })
                    }
                    None => {
                        debug!(event, action = ?action, "unsupported_action");
                        Err(WebhookError::UnsupportedAction)
                    }
                }
            }
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::with_default_routes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn recognized_actions_are_routed() {
        let router = EventRouter::with_default_routes();

        for action in [
            "created",
            "deleted",
            "new_permissions_accepted",
            "suspend",
            "unsuspend",
        ] {
            let routed = router
                .dispatch("installation", &json!({"action": action}))
                .unwrap();
            assert_eq!(routed.action.as_deref(), Some(action));
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        let router = EventRouter::with_default_routes();
        let err = router
            .dispatch("push", &json!({"action": "created"}))
            .unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedEvent));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let router = EventRouter::with_default_routes();
        let err = router
            .dispatch("installation", &json!({"action": "renamed"}))
            .unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedAction));
    }

    #[test]
    fn absent_action_routes_to_no_match() {
        let router = EventRouter::with_default_routes();
        let err = router.dispatch("installation", &json!({})).unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedAction));
    }

    #[test]
    fn non_string_action_routes_to_no_match() {
        let router = EventRouter::with_default_routes();
        let err = router
            .dispatch("installation", &json!({"action": 42}))
            .unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedAction));
    }

    #[test]
    fn registered_handler_receives_payload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut router = EventRouter::with_default_routes();
        router.on_installation(
            InstallationAction::Created,
            Arc::new(move |payload| {
                assert_eq!(payload["action"], "created");
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        router
            .dispatch("installation", &json!({"action": "created"}))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
