//! Webhook signature verification and event parsing.
//!
//! The processor signs each notification with a shared secret. The header
//! carries a unix timestamp and an HMAC-SHA256 over `"{timestamp}.{body}"`;
//! the timestamp bounds how long a captured payload can be replayed.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use sprout_common::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the notification signature, e.g.
/// `t=1700000000,v1=5257a869e7...`.
pub const SIGNATURE_HEADER: &str = "payment-signature";

/// Maximum accepted age of a signed payload, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Completion event type emitted when a hosted checkout finishes.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A notification from the payment processor.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: SessionObject,
}

/// The checkout session carried in a completion event.
#[derive(Debug, Deserialize)]
pub struct SessionObject {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Total charged, in minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Verify a webhook signature header against the raw request body.
///
/// `now_unix` is injected so expiry can be tested; callers pass the current
/// unix timestamp. Any parse failure, stale timestamp, or digest mismatch is
/// an [`Error::InvalidSignature`].
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, now_unix: i64) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }

    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => return Err(Error::InvalidSignature),
    };

    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(Error::InvalidSignature);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Error::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)
}

/// Produce a signature header for `payload`. Used by tests and local
/// processor simulators.
pub fn sign_payload(secret: &str, payload: &[u8], timestamp_unix: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp_unix.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp_unix},v1={digest}")
}

/// Parse a verified webhook body into an event.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent> {
    let event: WebhookEvent = serde_json::from_slice(payload)?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_valid_signature_roundtrip() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature(SECRET, body, &header, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_signature_within_tolerance() {
        let body = b"{}";
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature(SECRET, body, &header, 1_700_000_000 + 200).is_ok());
    }

    #[test]
    fn test_stale_signature_rejected() {
        let body = b"{}";
        let header = sign_payload(SECRET, body, 1_700_000_000);
        let result = verify_signature(SECRET, body, &header, 1_700_000_000 + 301);
        assert!(matches!(result, Err(Error::InvalidSignature)));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign_payload(SECRET, b"original", 1_700_000_000);
        let result = verify_signature(SECRET, b"tampered", &header, 1_700_000_000);
        assert!(matches!(result, Err(Error::InvalidSignature)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let header = sign_payload("other_secret", body, 1_700_000_000);
        let result = verify_signature(SECRET, body, &header, 1_700_000_000);
        assert!(matches!(result, Err(Error::InvalidSignature)));
    }

    #[test]
    fn test_malformed_header_rejected() {
        for header in ["", "t=abc,v1=zz", "v1=00ff", "t=1700000000"] {
            let result = verify_signature(SECRET, b"{}", header, 1_700_000_000);
            assert!(matches!(result, Err(Error::InvalidSignature)), "{header}");
        }
    }

    #[test]
    fn test_parse_completed_event() {
        let body = br#"{
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_123",
                    "payment_intent": "pi_456",
                    "metadata": {"registration_id": "reg-1", "class_id": "class-1"}
                }
            }
        }"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.event_type, CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.id, "cs_123");
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_456"));
        assert_eq!(
            event.data.object.metadata.get("registration_id").map(String::as_str),
            Some("reg-1")
        );
    }
}
