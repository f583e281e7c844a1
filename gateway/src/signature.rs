//! GitHub-style webhook signature verification.
//!
//! GitHub signs deliveries with HMAC-SHA256 over the raw request body
//! and sends the hex digest in the `X-Hub-Signature-256` header,
//! prefixed with `sha256=`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::secrets::SigningKey;

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix carried by the signature header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the hex HMAC-SHA256 digest of a raw body.
pub fn compute_signature(body: &[u8], key: &SigningKey) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Format a hex digest as the signature header value.
pub fn format_signature_header(hex_digest: &str) -> String {
    format!("{SIGNATURE_PREFIX}{hex_digest}")
}

/// Verify a `sha256=<hex>` header against the raw body.
///
/// Candidate keys are tried in order so that rotated-out keys keep
/// verifying until they are dropped from the ring. Comparison is
/// constant-time per candidate.
pub fn verify_signature(body: &[u8], header: &str, keys: &[SigningKey]) -> bool {
    let Some(hex_digest) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    keys.iter().any(|key| {
        let expected = compute_signature(body, key);
        constant_time_compare(&expected, hex_digest)
    })
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(bytes: &[u8]) -> SigningKey {
        SigningKey::new(bytes.to_vec())
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"action": "created"}"#;
        let signing_key = key(b"test-secret");
        let header = format_signature_header(&compute_signature(body, &signing_key));

        assert!(verify_signature(body, &header, &[signing_key]));
    }

    #[test]
    fn wrong_key_fails() {
        let body = br#"{"action": "created"}"#;
        let header = format_signature_header(&compute_signature(body, &key(b"right")));

        assert!(!verify_signature(body, &header, &[key(b"wrong")]));
    }

    #[test]
    fn tampered_body_fails() {
        let signing_key = key(b"test-secret");
        let header =
            format_signature_header(&compute_signature(b"original", &signing_key));

        assert!(!verify_signature(b"tampered", &header, &[signing_key]));
    }

    #[test]
    fn missing_prefix_fails() {
        let body = b"body";
        let signing_key = key(b"test-secret");
        let digest = compute_signature(body, &signing_key);

        assert!(!verify_signature(body, &digest, &[signing_key]));
    }

    #[test]
    fn fallback_key_still_verifies_after_rotation() {
        let body = b"body";
        let old = key(b"old-secret");
        let new = key(b"new-secret");
        let header = format_signature_header(&compute_signature(body, &old));

        assert!(verify_signature(body, &header, &[new.clone(), old]));
        assert!(!verify_signature(body, &header, &[new]));
    }

    #[test]
    fn no_keys_fails() {
        let header = format_signature_header("00");
        assert!(!verify_signature(b"body", &header, &[]));
    }

    #[test]
    fn constant_time_compare_basics() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
