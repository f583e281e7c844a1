//! Configuration module for environment variable parsing.

use std::env;

use crate::gateway::GatewayPolicy;
use crate::secrets::{Keyring, SigningKey};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Payload is nested under the delivery id (provider integration quirk)
    pub delivery_indirection: bool,

    /// Run the duplicate pre-check before routing instead of after
    pub dedup_before_route: bool,

    /// Primary signing key for endpoints that validate deliveries
    pub signing_key: Option<String>,

    /// Rotated-out signing keys still accepted during verification
    pub signing_key_fallbacks: Option<Vec<String>>,

    /// Optional JSON file of endpoints to preload into the in-memory store
    pub fixtures_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            delivery_indirection: parse_bool("GATEWAY_DELIVERY_INDIRECTION", false),

            dedup_before_route: parse_bool("GATEWAY_DEDUP_BEFORE_ROUTE", true),

            signing_key: env::var("GATEWAY_SIGNING_KEY").ok(),

            signing_key_fallbacks: parse_csv("GATEWAY_SIGNING_KEY_FALLBACKS"),

            fixtures_path: env::var("GATEWAY_FIXTURES").ok(),
        }
    }

    /// Gateway policy derived from this configuration.
    pub fn policy(&self) -> GatewayPolicy {
        GatewayPolicy {
            delivery_indirection: self.delivery_indirection,
            dedup_before_route: self.dedup_before_route,
        }
    }

    /// Keyring built from the configured signing keys, if any.
    pub fn keyring(&self) -> Option<Keyring> {
        let primary = self.signing_key.as_deref()?.trim();
        if primary.is_empty() {
            return None;
        }
        let fallbacks = self
            .signing_key_fallbacks
            .iter()
            .flatten()
            .map(|key| SigningKey::new(key.as_bytes().to_vec()))
            .collect();
        Some(Keyring::new(
            SigningKey::new(primary.as_bytes().to_vec()),
            fallbacks,
        ))
    }
}

/// Parse a boolean flag ("1", "true", "yes" are truthy).
fn parse_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_values() {
        env::set_var("TEST_BOOL", "true");
        assert!(parse_bool("TEST_BOOL", false));
        env::set_var("TEST_BOOL", "0");
        assert!(!parse_bool("TEST_BOOL", true));
        env::remove_var("TEST_BOOL");

        assert!(parse_bool("NONEXISTENT_VAR", true));
        assert!(!parse_bool("NONEXISTENT_VAR", false));
    }

    #[test]
    fn test_parse_csv() {
        env::set_var("TEST_CSV", "key1, key2, key3");
        let result = parse_csv("TEST_CSV");
        assert_eq!(
            result,
            Some(vec![
                "key1".to_string(),
                "key2".to_string(),
                "key3".to_string()
            ])
        );
        env::remove_var("TEST_CSV");
    }

    #[test]
    fn keyring_requires_primary_key() {
        let config = Config {
            port: 8080,
            delivery_indirection: false,
            dedup_before_route: true,
            signing_key: None,
            signing_key_fallbacks: Some(vec!["old".to_string()]),
            fixtures_path: None,
        };
        assert!(config.keyring().is_none());

        let config = Config {
            signing_key: Some("new".to_string()),
            ..config
        };
        let keyring = config.keyring().unwrap();
        assert_eq!(keyring.primary().as_bytes(), b"new");
        assert_eq!(keyring.candidates().len(), 2);
    }
}
