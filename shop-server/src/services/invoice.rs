//! Invoice collaborator
//!
//! Renders a PDF for a paid order and stores it, returning a durable URL.
//! Generation failure is tolerated upstream: the order stays valid without
//! an invoice and the document can be regenerated later.

use async_trait::async_trait;
use serde::Deserialize;

use super::{ServiceError, ServiceResult};
use crate::db::models::Order;

#[async_trait]
pub trait InvoiceService: Send + Sync {
    /// Generate and store the invoice document; returns its URL
    async fn generate(&self, order: &Order) -> ServiceResult<String>;
}

#[derive(Deserialize)]
struct InvoiceResponse {
    url: String,
}

/// HTTP client for the document rendering/storage service
pub struct HttpInvoiceService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpInvoiceService {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl InvoiceService for HttpInvoiceService {
    async fn generate(&self, order: &Order) -> ServiceResult<String> {
        let response: InvoiceResponse = self
            .client
            .post(format!("{}/v1/invoices", self.base_url))
            .bearer_auth(&self.api_key)
            .json(order)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("invoice", e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::Rejected("invoice", e.to_string()))?
            .json()
            .await
            .map_err(|e| ServiceError::Rejected("invoice", e.to_string()))?;
        Ok(response.url)
    }
}
