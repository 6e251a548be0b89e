//! Billing/payment session collaborator (REST API, no SDK dependency)
//!
//! Card payments run through externally hosted checkout sessions. The
//! provider calls back with a signed webhook when a session completes; the
//! signature scheme is HMAC-SHA256 over `"{timestamp}.{payload}"` carried in
//! a `t=…,v1=…` header.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{ServiceError, ServiceResult};

/// A created payment session
#[derive(Debug, Clone, PartialEq)]
pub struct BillingSession {
    pub id: String,
    /// Hosted payment page the customer is redirected to
    pub url: String,
}

/// One displayed line on the hosted payment page, amount in cents
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLineItem {
    pub name: String,
    pub quantity: i32,
    pub amount_cents: i64,
}

#[async_trait]
pub trait BillingService: Send + Sync {
    /// Create a hosted session for the amount still due on an order. The
    /// order is referenced by its integer `reference` so the webhook can
    /// locate it without sharing database ids.
    async fn create_session(
        &self,
        order_reference: i64,
        customer_email: &str,
        line_items: &[SessionLineItem],
        discount_cents: i64,
        gift_card_cents: i64,
    ) -> ServiceResult<BillingSession>;

    async fn is_session_expired(&self, session_id: &str) -> ServiceResult<bool>;

    async fn cancel_session(&self, session_id: &str) -> ServiceResult<()>;
}

/// HTTP client for the billing provider
pub struct HttpBillingService {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl HttpBillingService {
    pub fn new(
        base_url: String,
        secret_key: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
            success_url,
            cancel_url,
        }
    }
}

#[async_trait]
impl BillingService for HttpBillingService {
    async fn create_session(
        &self,
        order_reference: i64,
        customer_email: &str,
        line_items: &[SessionLineItem],
        discount_cents: i64,
        gift_card_cents: i64,
    ) -> ServiceResult<BillingSession> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("client_reference_id".into(), order_reference.to_string()),
            ("customer_email".into(), customer_email.to_string()),
            ("success_url".into(), self.success_url.clone()),
            ("cancel_url".into(), self.cancel_url.clone()),
            ("discount_amount".into(), discount_cents.to_string()),
            ("gift_card_amount".into(), gift_card_cents.to_string()),
        ];
        for (i, line) in line_items.iter().enumerate() {
            form.push((format!("line_items[{i}][name]"), line.name.clone()));
            form.push((
                format!("line_items[{i}][quantity]"),
                line.quantity.to_string(),
            ));
            form.push((
                format!("line_items[{i}][amount]"),
                line.amount_cents.to_string(),
            ));
        }

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("billing", e.to_string()))?
            .json()
            .await
            .map_err(|e| ServiceError::Rejected("billing", e.to_string()))?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(BillingSession {
                id: id.to_string(),
                url: url.to_string(),
            }),
            _ => Err(ServiceError::Rejected(
                "billing",
                format!("create_session failed: {resp}"),
            )),
        }
    }

    async fn is_session_expired(&self, session_id: &str) -> ServiceResult<bool> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("billing", e.to_string()))?
            .json()
            .await
            .map_err(|e| ServiceError::Rejected("billing", e.to_string()))?;

        Ok(resp["status"].as_str() == Some("expired"))
    }

    async fn cancel_session(&self, session_id: &str) -> ServiceResult<()> {
        let resp = self
            .client
            .post(format!(
                "{}/v1/checkout/sessions/{session_id}/expire",
                self.base_url
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("billing", e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Rejected(
                "billing",
                format!("cancel_session failed with {}", resp.status()),
            ))
        }
    }
}

/// A payment-completed webhook event, reduced to what finalization needs
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSession {
    pub session_id: String,
    pub order_reference: i64,
}

/// Verify a webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Extract the completed session out of a `checkout.session.completed`
/// event; None for any other event type or a malformed payload.
pub fn extract_completed_session(event: &serde_json::Value) -> Option<CompletedSession> {
    if event["type"].as_str() != Some("checkout.session.completed") {
        return None;
    }
    let obj = event.get("data")?.get("object")?;
    let session_id = obj["id"].as_str()?.to_string();
    let order_reference = obj["client_reference_id"]
        .as_str()
        .and_then(|s| s.parse::<i64>().ok())
        .or_else(|| obj["client_reference_id"].as_i64())?;
    Some(CompletedSession {
        session_id,
        order_reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let signed = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let ts = chrono::Utc::now().timestamp();
        let header = sign(payload, ts, "whsec_test");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{}"#;
        let ts = chrono::Utc::now().timestamp();
        let header = sign(payload, ts, "whsec_other");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let ts = chrono::Utc::now().timestamp();
        let header = sign(br#"{"amount":10}"#, ts, "whsec_test");
        assert!(verify_webhook_signature(br#"{"amount":99}"#, &header, "whsec_test").is_err());
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let payload = br#"{}"#;
        let ts = chrono::Utc::now().timestamp() - 600;
        let header = sign(payload, ts, "whsec_test");
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec_test"),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(verify_webhook_signature(b"{}", "nonsense", "whsec_test").is_err());
    }

    #[test]
    fn test_extract_completed_session() {
        let event = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_123", "client_reference_id": "1042" } }
        });
        let completed = extract_completed_session(&event).unwrap();
        assert_eq!(completed.session_id, "cs_123");
        assert_eq!(completed.order_reference, 1042);
    }

    #[test]
    fn test_extract_ignores_other_event_types() {
        let event = serde_json::json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "cs_123", "client_reference_id": "1042" } }
        });
        assert!(extract_completed_session(&event).is_none());
    }
}
