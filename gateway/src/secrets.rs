//! Signing-secret capability.
//!
//! The composition root constructs a provider and passes it into the
//! gateway; nothing here is process-global. A [`Keyring`] carries the
//! primary key plus an ordered list of fallbacks so keys can rotate
//! without downtime: verification tries every candidate in order while
//! new material is signed with the primary only.

use std::fmt;

use async_trait::async_trait;

use crate::store::EndpointId;

/// One candidate signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Key material stays out of logs.
impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Source of signing secrets for endpoints that validate deliveries.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Ordered candidate keys for an endpoint, primary first.
    async fn signing_keys(&self, endpoint: &EndpointId) -> Vec<SigningKey>;
}

/// A primary signing key with zero or more rotation fallbacks, shared
/// by every endpoint.
#[derive(Debug, Clone)]
pub struct Keyring {
    primary: SigningKey,
    fallbacks: Vec<SigningKey>,
}

impl Keyring {
    pub fn new(primary: SigningKey, fallbacks: Vec<SigningKey>) -> Self {
        Self { primary, fallbacks }
    }

    /// Key used to sign new material.
    pub fn primary(&self) -> &SigningKey {
        &self.primary
    }

    /// All candidate keys in verification order.
    pub fn candidates(&self) -> Vec<SigningKey> {
        let mut keys = Vec::with_capacity(1 + self.fallbacks.len());
        keys.push(self.primary.clone());
        keys.extend(self.fallbacks.iter().cloned());
        keys
    }
}

#[async_trait]
impl SecretProvider for Keyring {
    async fn signing_keys(&self, _endpoint: &EndpointId) -> Vec<SigningKey> {
        self.candidates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_are_ordered_primary_first() {
        let keyring = Keyring::new(
            SigningKey::new(b"new".to_vec()),
            vec![SigningKey::new(b"old".to_vec())],
        );

        let keys = keyring.candidates();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].as_bytes(), b"new");
        assert_eq!(keys[1].as_bytes(), b"old");
        assert_eq!(keyring.primary().as_bytes(), b"new");
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = SigningKey::new(b"super-secret".to_vec());
        assert_eq!(format!("{key:?}"), "SigningKey(..)");
    }

    #[tokio::test]
    async fn keyring_serves_the_same_keys_for_every_endpoint() {
        let keyring = Keyring::new(SigningKey::new(b"k".to_vec()), vec![]);

        let a = keyring.signing_keys(&EndpointId(1)).await;
        let b = keyring.signing_keys(&EndpointId(2)).await;
        assert_eq!(a, b);
    }
}
