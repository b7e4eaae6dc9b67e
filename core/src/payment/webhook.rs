// core/src/payment/webhook.rs

//! Verification and decoding of the processor's signed webhook events.
//!
//! The signature header looks like `t=1700000000,v1=<hex>,v1=<hex>`. Each
//! `v1` entry is HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint
//! secret; any one matching entry is accepted.

use crate::error::{ShopError, ShopResult};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
  secret: String,
  tolerance: Duration,
}

impl SignatureVerifier {
  pub fn new(secret: impl Into<String>) -> Self {
    Self {
      secret: secret.into(),
      tolerance: DEFAULT_TOLERANCE,
    }
  }

  pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
    self.tolerance = tolerance;
    self
  }

  /// Checks `header` against `payload` at wall-clock time `now` (unix seconds).
  pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> ShopResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
      match part.trim().split_once('=') {
        Some(("t", value)) => timestamp = value.parse().ok(),
        Some(("v1", value)) => {
          if let Ok(bytes) = hex::decode(value) {
            candidates.push(bytes);
          }
        }
        _ => {}
      }
    }

    let timestamp = timestamp.ok_or_else(|| ShopError::InvalidSignature("missing timestamp".to_string()))?;
    if candidates.is_empty() {
      return Err(ShopError::InvalidSignature("no v1 signature".to_string()));
    }

    let age = now.saturating_sub(timestamp).unsigned_abs();
    if age > self.tolerance.as_secs() {
      return Err(ShopError::InvalidSignature("timestamp outside tolerance".to_string()));
    }

    let mac = self.keyed_mac(timestamp, payload)?;
    // verify_slice compares in constant time
    if candidates.iter().any(|sig| mac.clone().verify_slice(sig).is_ok()) {
      Ok(())
    } else {
      Err(ShopError::InvalidSignature("signature mismatch".to_string()))
    }
  }

  /// Produces a header the processor would send for `payload` at `timestamp`.
  pub fn sign(&self, timestamp: i64, payload: &[u8]) -> ShopResult<String> {
    let digest = self.keyed_mac(timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
  }

  fn keyed_mac(&self, timestamp: i64, payload: &[u8]) -> ShopResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
      .map_err(|e| ShopError::Internal(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
  pub object: JsonValue,
}

/// The envelope of a processor event. Only the fields settlement reads are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: EventData,
}

impl PaymentEvent {
  pub fn parse(payload: &[u8]) -> ShopResult<Self> {
    serde_json::from_slice(payload).map_err(|e| ShopError::MalformedEvent(format!("invalid event JSON: {e}")))
  }

  /// Reads a numeric id out of `data.object.metadata`. The processor stores
  /// metadata as strings, plain numbers are accepted as well.
  pub fn metadata_id(&self, key: &str) -> ShopResult<i64> {
    let value = self
      .data
      .object
      .get("metadata")
      .and_then(|m| m.get(key))
      .ok_or_else(|| ShopError::MalformedEvent(format!("metadata '{key}' is missing")))?;

    let id = match value {
      JsonValue::String(s) => s.trim().parse().ok(),
      JsonValue::Number(n) => n.as_i64(),
      _ => None,
    };
    id.ok_or_else(|| ShopError::MalformedEvent(format!("metadata '{key}' is not a valid id")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const NOW: i64 = 1_700_000_000;

  #[test]
  fn accepts_own_signature() {
    let verifier = SignatureVerifier::new("whsec_test");
    let header = verifier.sign(NOW, b"{}").unwrap();
    assert!(verifier.verify(b"{}", &header, NOW + 10).is_ok());
  }

  #[test]
  fn accepts_any_matching_v1_entry() {
    let verifier = SignatureVerifier::new("whsec_test");
    let good = verifier.sign(NOW, b"body").unwrap();
    let good_sig = good.split("v1=").nth(1).unwrap();
    let header = format!("t={NOW},v1={},v1={good_sig}", "00".repeat(32));
    assert!(verifier.verify(b"body", &header, NOW).is_ok());
  }

  #[test]
  fn rejects_tampered_payload_and_foreign_secret() {
    let verifier = SignatureVerifier::new("whsec_test");
    let header = verifier.sign(NOW, b"body").unwrap();
    assert!(matches!(
      verifier.verify(b"body!", &header, NOW),
      Err(ShopError::InvalidSignature(_))
    ));

    let other = SignatureVerifier::new("whsec_other");
    assert!(matches!(other.verify(b"body", &header, NOW), Err(ShopError::InvalidSignature(_))));
  }

  #[test]
  fn rejects_stale_and_garbled_headers() {
    let verifier = SignatureVerifier::new("whsec_test");
    let header = verifier.sign(NOW, b"body").unwrap();
    assert!(verifier.verify(b"body", &header, NOW + 301).is_err());
    assert!(verifier.verify(b"body", "", NOW).is_err());
    assert!(verifier.verify(b"body", "t=abc,v1=zz", NOW).is_err());
    assert!(verifier.verify(b"body", &format!("t={NOW}"), NOW).is_err());
  }

  #[test]
  fn metadata_ids_accept_strings_and_numbers() {
    let event = PaymentEvent::parse(
      br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"metadata":{"orderId":"12","userId":5}}}}"#,
    )
    .unwrap();
    assert_eq!(event.metadata_id("orderId").unwrap(), 12);
    assert_eq!(event.metadata_id("userId").unwrap(), 5);
    assert!(matches!(event.metadata_id("cartId"), Err(ShopError::MalformedEvent(_))));
  }
}
