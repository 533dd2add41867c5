//! HMAC-SHA256 payload signing.
//!
//! Deliveries to subscribers with a secret carry
//! `X-Hub-Signature: sha256=<hex>`, where the MAC is computed over the exact
//! request body with `hub.secret` as the key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    hex::encode(mac(secret, payload).finalize().into_bytes())
}

// HMAC pads or hashes the key to the block size, so every key length is accepted.
fn mac(secret: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    mac
}

/// Build the signature header value, or `None` when the secret is empty.
///
/// An empty secret means "unsigned"; the payload is never signed with an
/// empty key.
pub fn signature_header(secret: &str, payload: &[u8]) -> Option<String> {
    if secret.is_empty() {
        return None;
    }
    Some(format!("{}{}", SIGNATURE_PREFIX, sign(secret, payload)))
}

/// Check a `sha256=<hex>` header against `payload` in constant time.
pub fn verify(secret: &str, payload: &[u8], header: &str) -> bool {
    let Some(hex_sig) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    mac(secret, payload).verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4231_case_2() {
        let digest = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_matches_independent_mac() {
        let payload = br#"{"message":"hej","topic":"/a/topic"}"#;

        let mut mac = HmacSha256::new_from_slice(b"s3cr3t").unwrap();
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(sign("s3cr3t", payload), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = sign("key", b"body");
        let b = sign("key", b"body");
        assert_eq!(a, b);
        assert_ne!(a, sign("key", b"body2"));
        assert_ne!(a, sign("key2", b"body"));
    }

    #[test]
    fn test_empty_secret_produces_no_header() {
        assert_eq!(signature_header("", b"body"), None);
    }

    #[test]
    fn test_header_round_trips_through_verify() {
        let header = signature_header("s3cr3t", b"body").unwrap();
        assert!(header.starts_with(SIGNATURE_PREFIX));
        assert!(verify("s3cr3t", b"body", &header));
        assert!(!verify("wrong", b"body", &header));
        assert!(!verify("s3cr3t", b"tampered", &header));
    }

    #[test]
    fn test_keys_of_any_length_are_accepted() {
        let long_key = "k".repeat(1024);
        for key in ["x", "s3cr3t", long_key.as_str()] {
            let digest = sign(key, b"body");
            assert_eq!(digest.len(), 64);
            let header = signature_header(key, b"body").unwrap();
            assert!(verify(key, b"body", &header));
        }
    }

    #[test]
    fn test_verify_rejects_malformed_headers() {
        let header = signature_header("s3cr3t", b"body").unwrap();
        let bare = header.strip_prefix(SIGNATURE_PREFIX).unwrap();
        assert!(!verify("s3cr3t", b"body", bare));
        assert!(!verify("s3cr3t", b"body", "sha256=not-hex"));
    }
}
