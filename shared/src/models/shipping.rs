//! Shipping quote DTOs (mirrors the quote collaborator's vocabulary)

use serde::{Deserialize, Serialize};

/// One shippable offer for a (country, weight) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOffer {
    /// Carrier code ("COLISSIMO", "MONDIAL_RELAY", ...)
    pub carrier: String,
    /// Carrier-specific offer id
    pub offer: String,
    /// Display name shown at checkout
    pub name: String,
    pub price_tax_included: f64,
    pub price_tax_excluded: f64,
    /// Estimated delivery delay in days, when the carrier publishes one
    pub delivery_days: Option<u32>,
    /// Offer delivers to a relay/pickup point instead of the home address
    pub pickup: bool,
}

/// Relay point for pickup offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupPoint {
    pub id: String,
    pub name: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
}
