//! Promotion code entity
//!
//! The discount rule and conditions are immutable; only the `used` counter
//! moves, exactly once per finalized order referencing the code.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// The discount rule (closed sum type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Percentage of the gift-card-excluded subtotal (0–100)
    Percentage { value: f64 },
    /// Fixed amount, tax included
    FixedAmount { value: f64 },
    /// Shipping cost is waived; the subtotal is untouched
    FreeShipping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCode {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Customer-facing code, unique, matched case-insensitively uppercased
    pub code: String,
    pub discount: Discount,
    /// Subtotal (including paid extras) required for the code to apply
    pub minimum_amount: Option<f64>,
    /// RFC 3339; None = never expires
    pub expires_at: Option<String>,
    /// None = unlimited
    pub usage_limit: Option<i64>,
    /// Incremented once per finalized order, never decremented
    #[serde(default)]
    pub used: i64,
    /// When non-empty, the cart must contain at least one of these articles
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub article_filter: Vec<RecordId>,
}
