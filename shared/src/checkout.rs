//! Checkout request/response types
//!
//! A checkout submission carries everything the order assembly needs beyond
//! the cart itself: shipping selection, billing address, payment method,
//! promotion code, gift cards to spend and paid extras. The same payload
//! drives both `POST /api/checkout/quote` (no persistence, no counters) and
//! `POST /api/checkout`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::order::PaymentMethod;

/// Postal address used for billing and home delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 16))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    /// ISO 3166-1 alpha-2
    #[validate(length(equal = 2))]
    pub country: String,
}

/// Carrier + offer picked by the customer at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShippingSelection {
    #[validate(length(min = 1, max = 64))]
    pub carrier: String,
    #[validate(length(min = 1, max = 64))]
    pub offer: String,
    /// Destination country (ISO 3166-1 alpha-2)
    #[validate(length(equal = 2))]
    pub country: String,
    /// Required when the offer delivers to a relay point
    pub pickup_point: Option<String>,
}

/// Optional paid add-ons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtrasInput {
    /// Paid manufacturing-time reduction
    #[serde(default)]
    pub reduced_lead_time: bool,
}

/// The checkout submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CheckoutInput {
    #[validate(nested)]
    pub shipping: ShippingSelection,
    #[validate(nested)]
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 64))]
    pub promotion_code: Option<String>,
    /// Gift cards to spend, in spending order ("gift_card:xyz")
    #[serde(default)]
    pub gift_cards: Vec<String>,
    #[serde(default)]
    pub extras: ExtrasInput,
}

/// Full monetary breakdown of an assembled (not yet persisted) order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutQuote {
    /// Subtotal before any discount, tax included
    pub sub_total_tax_included: f64,
    /// Subtotal after the promotion discount, tax included
    pub discounted_sub_total_tax_included: f64,
    pub discount_amount: f64,
    /// Per-VAT-rate buckets after discount ("20" → amount)
    pub taxes: BTreeMap<String, f64>,
    pub shipping_tax_included: f64,
    /// Quoted carrier price before any free-shipping override
    pub shipping_original_tax_included: f64,
    pub extras_tax_included: f64,
    /// Grand total, tax included (unchanged by gift-card allocation)
    pub total_tax_included: f64,
    /// Gift-card id → amount consumed
    pub gift_cards: BTreeMap<String, f64>,
    /// What remains to charge through the selected payment method
    pub amount_due: f64,
    pub free_gift: bool,
}

/// What the storefront does next after a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payment", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Redirect the customer to the external payment page
    Card {
        order_reference: i64,
        payment_url: String,
    },
    /// Show the transfer instructions; an admin confirms reception later
    BankTransfer {
        order_reference: i64,
        amount_due: f64,
    },
    /// Balance fully covered by gift cards, order is already PAID
    Paid { order_reference: i64 },
}
