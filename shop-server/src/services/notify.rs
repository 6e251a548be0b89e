//! Notification collaborator (templated email + CRM events)
//!
//! Fire-and-forget: a failed notification is logged and never blocks an
//! order. Callers go through [`send_email_logged`]/[`crm_event_logged`] so
//! the tolerance is in one place.

use async_trait::async_trait;

use super::{ServiceError, ServiceResult};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a templated email
    async fn send_email(
        &self,
        to: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> ServiceResult<()>;

    /// Push an event to the CRM
    async fn crm_event(&self, event: &str, context: &serde_json::Value) -> ServiceResult<()>;
}

/// Send an email, logging failure instead of propagating it
pub async fn send_email_logged(
    notifier: &dyn Notifier,
    to: &str,
    template: &str,
    context: &serde_json::Value,
) {
    if let Err(e) = notifier.send_email(to, template, context).await {
        tracing::warn!(to = to, template = template, error = %e, "Email notification failed");
    }
}

/// Push a CRM event, logging failure instead of propagating it
pub async fn crm_event_logged(notifier: &dyn Notifier, event: &str, context: &serde_json::Value) {
    if let Err(e) = notifier.crm_event(event, context).await {
        tracing::warn!(event = event, error = %e, "CRM notification failed");
    }
}

/// HTTP client for the transactional email / CRM gateway
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpNotifier {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> ServiceResult<()> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("notify", e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Rejected(
                "notify",
                format!("gateway answered {}", resp.status()),
            ))
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_email(
        &self,
        to: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> ServiceResult<()> {
        self.post(
            "/v1/emails",
            serde_json::json!({ "to": to, "template": template, "context": context }),
        )
        .await
    }

    async fn crm_event(&self, event: &str, context: &serde_json::Value) -> ServiceResult<()> {
        self.post(
            "/v1/events",
            serde_json::json!({ "event": event, "context": context }),
        )
        .await
    }
}
