//! Cart item inputs and the read-time priced projection
//!
//! The persisted cart only stores what the customer picked. Prices, weights
//! and stock clamps are recomputed against the live catalog on every read and
//! returned as a [`PricedCart`]; the stored totals are advisory only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which catalog table a customization slot draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartKind {
    Fabric,
    Piping,
    Embroidery,
}

/// One customization pick: a slot on the article filled with a catalog reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationChoice {
    /// Slot name on the article ("exterior", "lining", "initials", ...)
    pub slot: String,
    pub kind: PartKind,
    /// Record id of the fabric/piping/embroidery color ("fabric:xyz")
    pub reference: String,
}

/// What the customer adds to the cart (one variant per item kind)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartItemInput {
    /// Bespoke article with per-part fabric/piping/embroidery choices
    Customized {
        /// Record id of the article ("article:xyz")
        article: String,
        quantity: i32,
        choices: Vec<CustomizationChoice>,
        /// Optional 3D-preview capture uploaded by the storefront
        preview_image: Option<String>,
    },
    /// Pre-made variant with finite stock
    InStock {
        /// Record id of the sku ("stock_sku:xyz")
        sku: String,
        quantity: i32,
    },
    /// Self-contained gift card, no catalog reference
    GiftCard {
        amount: f64,
        recipient_email: String,
        recipient_name: Option<String>,
        message: Option<String>,
    },
}

impl CartItemInput {
    pub fn quantity(&self) -> i32 {
        match self {
            Self::Customized { quantity, .. } | Self::InStock { quantity, .. } => *quantity,
            Self::GiftCard { .. } => 1,
        }
    }
}

/// Kind-specific payload of a priced line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricedItemKind {
    Customized {
        article: String,
        choices: Vec<CustomizationChoice>,
    },
    InStock {
        sku: String,
    },
    GiftCard {
        amount: f64,
        recipient_email: String,
        recipient_name: Option<String>,
        message: Option<String>,
    },
}

/// One cart line resolved against the live catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItem {
    #[serde(flatten)]
    pub item: PricedItemKind,
    /// Index of the backing line in the stored cart
    pub cart_index: usize,
    pub description: String,
    pub image: Option<String>,
    /// Effective quantity (clamped to stock / raised to the article minimum)
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
    pub weight_grams: i64,
    /// VAT share inside `line_total` (0 for gift cards)
    pub tax: f64,
}

impl PricedItem {
    pub fn is_gift_card(&self) -> bool {
        matches!(self.item, PricedItemKind::GiftCard { .. })
    }
}

/// The authoritative cart view, recomputed on every read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PricedCart {
    pub items: Vec<PricedItem>,
    /// Sum of line totals, tax included
    pub sub_total_tax_included: f64,
    /// Per-VAT-rate buckets, keyed by rate ("20" → amount)
    pub taxes: BTreeMap<String, f64>,
    pub total_weight_grams: i64,
}

impl PricedCart {
    /// Subtotal with gift-card lines excluded (the discountable base)
    pub fn sub_total_excluding_gift_cards(&self) -> f64 {
        self.items
            .iter()
            .filter(|i| !i.is_gift_card())
            .map(|i| i.line_total)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
