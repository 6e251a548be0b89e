//! Catalog entities: made-to-order articles, pre-made skus, customization parts
//!
//! The pricing engine never reads these tables directly; it works on a
//! pre-fetched snapshot so a cart read is one batch of lookups.

use serde::{Deserialize, Serialize};
use shared::models::cart::PartKind;
use surrealdb::RecordId;

use super::serde_helpers;

/// One customization slot on a made-to-order article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePart {
    /// Slot name ("exterior", "lining", "initials", ...)
    pub slot: String,
    pub kind: PartKind,
}

/// Made-to-order article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, tax included
    pub price: f64,
    pub weight_grams: i64,
    /// Orders below this quantity are raised to it at pricing time
    #[serde(default = "default_minimum_quantity")]
    pub minimum_quantity: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub enabled: bool,
    pub image: Option<String>,
    #[serde(default)]
    pub parts: Vec<ArticlePart>,
    /// Manufacturing delay communicated to the customer
    #[serde(default = "default_lead_time_days")]
    pub lead_time_days: i32,
}

fn default_true() -> bool {
    true
}

fn default_minimum_quantity() -> i32 {
    1
}

fn default_lead_time_days() -> i32 {
    21
}

/// Pre-made variant with finite stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSku {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, tax included
    pub price: f64,
    pub weight_grams: i64,
    pub stock: i64,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub enabled: bool,
    pub image: Option<String>,
}

/// Fabric choice for a customization slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fabric {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub enabled: bool,
}

/// Piping choice for a customization slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piping {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub enabled: bool,
}

/// Embroidery thread color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbroideryColor {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub enabled: bool,
}
