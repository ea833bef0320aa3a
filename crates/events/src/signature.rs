//! Envelope secret computation and verification (HMAC-SHA256).
//!
//! Producers derive the envelope secret from the payload bytes and the
//! application-wide shared secret; consumers verify it before trusting the
//! payload. Verification is the first step in event handling: a forged or
//! corrupted envelope is rejected before parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded envelope secret for a payload.
pub fn compute_secret(payload: &[u8], app_secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret).expect("HMAC accepts keys of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded envelope secret against the payload.
///
/// Uses the HMAC library's constant-time comparison; malformed hex simply
/// fails verification, it never panics.
pub fn verify_secret(payload: &[u8], secret_hex: &str, app_secret: &[u8]) -> bool {
    let Ok(expected) = hex::decode(secret_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn verify_accepts_the_computed_secret() {
        let payload = br#"{"reference":"pay_123"}"#;
        let secret = compute_secret(payload, b"app-secret");
        assert!(verify_secret(payload, &secret, b"app-secret"));
    }

    #[test]
    fn verify_rejects_the_wrong_app_secret() {
        let payload = b"payload";
        let secret = compute_secret(payload, b"right");
        assert!(!verify_secret(payload, &secret, b"wrong"));
    }

    #[test]
    fn verify_rejects_malformed_hex_without_panicking() {
        assert!(!verify_secret(b"payload", "", b"secret"));
        assert!(!verify_secret(b"payload", "zz-not-hex", b"secret"));
        assert!(!verify_secret(b"payload", "abcd", b"secret"));
    }

    proptest! {
        #[test]
        fn prop_seal_verify_roundtrip(payload: Vec<u8>, app_secret: Vec<u8>) {
            let secret = compute_secret(&payload, &app_secret);
            prop_assert!(verify_secret(&payload, &secret, &app_secret));
        }

        #[test]
        fn prop_modified_payload_fails(original: Vec<u8>, modified: Vec<u8>, app_secret: Vec<u8>) {
            prop_assume!(original != modified);
            let secret = compute_secret(&original, &app_secret);
            prop_assert!(!verify_secret(&modified, &secret, &app_secret));
        }

        #[test]
        fn prop_wrong_secret_fails(payload: Vec<u8>, secret1: Vec<u8>, secret2: Vec<u8>) {
            prop_assume!(secret1 != secret2);
            let secret = compute_secret(&payload, &secret1);
            prop_assert!(!verify_secret(&payload, &secret, &secret2));
        }

        #[test]
        fn prop_arbitrary_header_never_panics(header: String, payload: Vec<u8>, app_secret: Vec<u8>) {
            let _ = verify_secret(&payload, &header, &app_secret);
        }
    }
}
