//! Order entity
//!
//! Created by the assembly step, immutable once PAID except for
//! `workflow_step` and the regenerable `invoice_url`. Every customization
//! reference is resolved to a human-readable snapshot at creation time, so
//! the order stays self-contained even if catalog entities are later
//! deleted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::models::cart::PartKind;
use shared::models::order::{OrderStatus, PaymentMethod, WorkflowStep};
use shared::checkout::Address;
use surrealdb::RecordId;

use super::serde_helpers;

/// A customization choice with the catalog name baked in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedChoice {
    pub slot: String,
    pub kind: PartKind,
    /// Display name at order time ("Liberty Adelajda", "Gold thread", ...)
    pub name: String,
}

/// One order line (mirrors the cart item kinds, fully resolved)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderItem {
    Customized {
        article_name: String,
        quantity: i32,
        unit_price: f64,
        /// Line total after any promotion discount
        total: f64,
        /// Line total before the promotion discount
        original_total: f64,
        weight_grams: i64,
        tax: f64,
        customizations: Vec<ResolvedChoice>,
        image: Option<String>,
    },
    InStock {
        #[serde(with = "serde_helpers::record_id")]
        sku: RecordId,
        name: String,
        quantity: i32,
        unit_price: f64,
        total: f64,
        original_total: f64,
        weight_grams: i64,
        tax: f64,
        image: Option<String>,
    },
    /// Face value, excluded from discounting and VAT
    GiftCard {
        amount: f64,
        recipient_email: String,
        recipient_name: Option<String>,
        message: Option<String>,
    },
}

impl OrderItem {
    /// Line total after discount (face value for gift cards)
    pub fn total(&self) -> f64 {
        match self {
            Self::Customized { total, .. } | Self::InStock { total, .. } => *total,
            Self::GiftCard { amount, .. } => *amount,
        }
    }
}

/// Monetary breakdown, all fields rounded to two decimals independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrderTotals {
    /// Item subtotal before discount, tax included
    pub sub_total_tax_included: f64,
    /// Item subtotal after the promotion discount, tax included
    pub discounted_sub_total_tax_included: f64,
    /// Per-VAT-rate buckets before discount ("20" → amount)
    pub taxes: BTreeMap<String, f64>,
    /// Per-VAT-rate buckets after discount
    pub discounted_taxes: BTreeMap<String, f64>,
    /// Grand total: discounted subtotal + shipping + extras, tax included.
    /// Gift-card consumption does not change this, only `amount_due`.
    pub total_tax_included: f64,
    /// What is charged through the selected payment method
    pub amount_due: f64,
    pub total_weight_grams: i64,
}

/// Shipping method and prices as quoted/charged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub carrier: String,
    pub offer: String,
    pub country: String,
    pub pickup_point: Option<String>,
    /// Charged price (0 when free-shipping applies)
    pub tax_included: f64,
    /// Quoted carrier price, kept for invoicing even when waived
    pub original_tax_included: f64,
    pub free: bool,
    /// Label document bought when the order moves to SHIPPING
    #[serde(default)]
    pub label_url: Option<String>,
}

/// Billing details frozen at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub address: Address,
    pub payment_method: PaymentMethod,
    /// Gift-card id → amount consumed by this order
    #[serde(default)]
    pub gift_cards: BTreeMap<String, f64>,
    /// External billing session backing a card payment
    pub session_id: Option<String>,
}

/// Promotion code snapshot (not a live reference)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSnapshot {
    pub code: String,
    /// Discount actually granted on this order, tax included
    pub amount: f64,
    pub free_shipping: bool,
}

/// Paid extras (manufacturing-time reduction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExtras {
    pub reduced_lead_time: bool,
    pub tax_included: f64,
    pub tax: f64,
}

/// Who ordered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub user: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Monotonically increasing integer, assigned max+1 at creation
    pub reference: i64,
    pub status: OrderStatus,
    pub workflow_step: WorkflowStep,
    pub customer: Customer,
    pub totals: OrderTotals,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingLine,
    pub billing: BillingInfo,
    pub promotion: Option<PromotionSnapshot>,
    pub extras: Option<OrderExtras>,
    /// Order crossed the configured gift threshold (fulfillment flag)
    #[serde(default)]
    pub free_gift: bool,
    pub invoice_url: Option<String>,
    /// RFC 3339
    pub created_at: String,
    pub paid_at: Option<String>,
}
