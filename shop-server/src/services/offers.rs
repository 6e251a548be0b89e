//! Offers/content configuration collaborator
//!
//! Free-shipping threshold, gift threshold, feature switches and the
//! reduced-lead-time price live in external content config. The server
//! reads them through [`OffersProvider`]; a CMS-backed impl fetches them
//! over HTTP and a static impl serves the env-configured defaults (also the
//! fallback when the CMS is unreachable).

use async_trait::async_trait;
use serde::Deserialize;

use super::{ServiceError, ServiceResult};
use crate::core::Config;

/// Shipping is waived for this carrier/country combination above the threshold
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FreeShippingRule {
    pub threshold: f64,
    pub carrier: String,
    pub countries: Vec<String>,
}

/// Current shop offers and feature switches
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopOffers {
    pub free_shipping: Option<FreeShippingRule>,
    /// Orders above this (post-discount, gift-card-excluded) subtotal get a
    /// free gift slipped into the parcel
    pub gift_threshold: Option<f64>,
    pub customized_enabled: bool,
    pub reduced_lead_time_enabled: bool,
    /// Price of the paid manufacturing-time reduction, tax included
    pub reduced_lead_time_price: f64,
    pub default_lead_time_days: i32,
}

impl Default for ShopOffers {
    fn default() -> Self {
        Self {
            free_shipping: None,
            gift_threshold: None,
            customized_enabled: true,
            reduced_lead_time_enabled: true,
            reduced_lead_time_price: 15.0,
            default_lead_time_days: 21,
        }
    }
}

impl ShopOffers {
    pub fn from_config(config: &Config) -> Self {
        let free_shipping = config.free_shipping_threshold.map(|threshold| FreeShippingRule {
            threshold,
            carrier: config.free_shipping_carrier.clone(),
            countries: config.free_shipping_countries.clone(),
        });
        Self {
            free_shipping,
            gift_threshold: config.gift_threshold,
            customized_enabled: config.customized_enabled,
            reduced_lead_time_enabled: config.reduced_lead_time_enabled,
            reduced_lead_time_price: config.reduced_lead_time_price,
            default_lead_time_days: config.default_lead_time_days,
        }
    }
}

#[async_trait]
pub trait OffersProvider: Send + Sync {
    async fn current(&self) -> ServiceResult<ShopOffers>;
}

/// Env-configured offers, no external fetch
#[derive(Debug, Clone)]
pub struct StaticOffers {
    offers: ShopOffers,
}

impl StaticOffers {
    pub fn new(offers: ShopOffers) -> Self {
        Self { offers }
    }
}

#[async_trait]
impl OffersProvider for StaticOffers {
    async fn current(&self) -> ServiceResult<ShopOffers> {
        Ok(self.offers.clone())
    }
}

/// CMS-backed offers with fallback to the configured defaults
pub struct HttpOffersProvider {
    client: reqwest::Client,
    url: String,
    fallback: ShopOffers,
}

impl HttpOffersProvider {
    pub fn new(url: String, fallback: ShopOffers) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            fallback,
        }
    }
}

#[async_trait]
impl OffersProvider for HttpOffersProvider {
    async fn current(&self) -> ServiceResult<ShopOffers> {
        let fetched = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ServiceError::Unreachable("offers", e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::Rejected("offers", e.to_string()))?
            .json::<ShopOffers>()
            .await;

        match fetched {
            Ok(offers) => Ok(offers),
            Err(e) => {
                // Content config is advisory: a broken CMS must not block checkout
                tracing::warn!(error = %e, "Offers fetch failed, using configured defaults");
                Ok(self.fallback.clone())
            }
        }
    }
}
