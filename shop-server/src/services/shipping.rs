//! Shipping quote collaborator
//!
//! The carrier aggregator is an opaque HTTP service: offers for a
//! (country, weight) pair, an exact price for a chosen offer, relay points,
//! and label purchase for the back office. The wire protocol stays behind
//! this trait.

use async_trait::async_trait;
use serde::Deserialize;
use shared::checkout::Address;
use shared::models::shipping::{PickupPoint, ShippingOffer};

use super::{ServiceError, ServiceResult};

#[async_trait]
pub trait ShippingService: Send + Sync {
    /// All shippable offers for a destination country and parcel weight
    async fn get_offers(&self, country: &str, weight_grams: i64)
        -> ServiceResult<Vec<ShippingOffer>>;

    /// Exact price of one carrier offer for the parcel
    async fn get_price(
        &self,
        carrier: &str,
        offer: &str,
        weight_grams: i64,
        country: &str,
    ) -> ServiceResult<ShippingOffer>;

    /// Relay points near a zip code for pickup offers
    async fn list_pickup_points(
        &self,
        carrier: &str,
        country: &str,
        zip_code: &str,
    ) -> ServiceResult<Vec<PickupPoint>>;

    /// Buy a label for a paid order; returns the label document URL
    async fn buy_shipping_label(
        &self,
        order_reference: i64,
        carrier: &str,
        offer: &str,
        weight_grams: i64,
        address: &Address,
        pickup_point: Option<&str>,
    ) -> ServiceResult<String>;
}

/// HTTP client for the carrier aggregator API
pub struct HttpShippingService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpShippingService {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ServiceResult<T> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("shipping", e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::Rejected("shipping", e.to_string()))?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Rejected("shipping", e.to_string()))
    }
}

#[derive(Deserialize)]
struct LabelResponse {
    url: String,
}

#[async_trait]
impl ShippingService for HttpShippingService {
    async fn get_offers(
        &self,
        country: &str,
        weight_grams: i64,
    ) -> ServiceResult<Vec<ShippingOffer>> {
        self.get_json(
            "/v1/offers",
            &[
                ("country", country.to_string()),
                ("weight", weight_grams.to_string()),
            ],
        )
        .await
    }

    async fn get_price(
        &self,
        carrier: &str,
        offer: &str,
        weight_grams: i64,
        country: &str,
    ) -> ServiceResult<ShippingOffer> {
        self.get_json(
            "/v1/price",
            &[
                ("carrier", carrier.to_string()),
                ("offer", offer.to_string()),
                ("weight", weight_grams.to_string()),
                ("country", country.to_string()),
            ],
        )
        .await
    }

    async fn list_pickup_points(
        &self,
        carrier: &str,
        country: &str,
        zip_code: &str,
    ) -> ServiceResult<Vec<PickupPoint>> {
        self.get_json(
            "/v1/pickup-points",
            &[
                ("carrier", carrier.to_string()),
                ("country", country.to_string()),
                ("zip_code", zip_code.to_string()),
            ],
        )
        .await
    }

    async fn buy_shipping_label(
        &self,
        order_reference: i64,
        carrier: &str,
        offer: &str,
        weight_grams: i64,
        address: &Address,
        pickup_point: Option<&str>,
    ) -> ServiceResult<String> {
        let body = serde_json::json!({
            "order_reference": order_reference,
            "carrier": carrier,
            "offer": offer,
            "weight": weight_grams,
            "address": address,
            "pickup_point": pickup_point,
        });
        let response: LabelResponse = self
            .client
            .post(format!("{}/v1/labels", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("shipping", e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::Rejected("shipping", e.to_string()))?
            .json()
            .await
            .map_err(|e| ServiceError::Rejected("shipping", e.to_string()))?;
        Ok(response.url)
    }
}
