//! Cart entity (one per user, mutable)
//!
//! Stored totals are advisory; the authoritative view is the read-time
//! projection computed by the pricing engine. The cart also carries a weak
//! reference to at most one in-flight draft order (see the draft guard).

use serde::{Deserialize, Serialize};
use shared::models::cart::{CartItemInput, CustomizationChoice};
use surrealdb::RecordId;

use super::serde_helpers;

/// One stored cart line (closed sum type, one variant per item kind)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartItem {
    Customized {
        #[serde(with = "serde_helpers::record_id")]
        article: RecordId,
        quantity: i32,
        choices: Vec<CustomizationChoice>,
        preview_image: Option<String>,
    },
    InStock {
        #[serde(with = "serde_helpers::record_id")]
        sku: RecordId,
        quantity: i32,
    },
    GiftCard {
        amount: f64,
        recipient_email: String,
        recipient_name: Option<String>,
        message: Option<String>,
    },
}

impl CartItem {
    pub fn quantity(&self) -> i32 {
        match self {
            Self::Customized { quantity, .. } | Self::InStock { quantity, .. } => *quantity,
            Self::GiftCard { .. } => 1,
        }
    }

    pub fn set_quantity(&mut self, qty: i32) {
        match self {
            Self::Customized { quantity, .. } | Self::InStock { quantity, .. } => *quantity = qty,
            // Gift cards are single lines; quantity is fixed
            Self::GiftCard { .. } => {}
        }
    }

    /// Build a stored line from the API input. Record id strings are parsed
    /// here so malformed references are rejected at the boundary.
    pub fn from_input(input: CartItemInput) -> Result<Self, String> {
        match input {
            CartItemInput::Customized {
                article,
                quantity,
                choices,
                preview_image,
            } => {
                let article: RecordId = article
                    .parse()
                    .map_err(|_| format!("invalid article id: {article}"))?;
                Ok(Self::Customized {
                    article,
                    quantity,
                    choices,
                    preview_image,
                })
            }
            CartItemInput::InStock { sku, quantity } => {
                let sku: RecordId = sku.parse().map_err(|_| format!("invalid sku id: {sku}"))?;
                Ok(Self::InStock { sku, quantity })
            }
            CartItemInput::GiftCard {
                amount,
                recipient_email,
                recipient_name,
                message,
            } => Ok(Self::GiftCard {
                amount,
                recipient_email,
                recipient_name,
                message,
            }),
        }
    }
}

/// The cart record; id is `cart:<user_id>` so the 1:1 mapping is structural
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Owning user id (redundant with the record key, kept for queries)
    pub user: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Weak reference to the in-flight draft order, if any
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub draft_order: Option<RecordId>,
    pub updated_at: String,
}

impl Cart {
    pub const TABLE: &'static str = "cart";

    pub fn record_id(user: &str) -> RecordId {
        RecordId::from_table_key(Self::TABLE, user)
    }
}
