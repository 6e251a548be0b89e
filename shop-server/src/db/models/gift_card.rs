//! Gift card entity
//!
//! `consumed_amount` only grows and never exceeds `amount`. A card belongs
//! to a user once claimed; until then it is keyed by recipient email.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Cards unused for this long can no longer be spent
pub const GIFT_CARD_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Claim code printed in the recipient email, unique
    pub code: String,
    /// Face value, tax free
    pub amount: f64,
    #[serde(default)]
    pub consumed_amount: f64,
    /// Owning user once claimed
    pub owner: Option<String>,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub message: Option<String>,
    /// Reference of the order that purchased this card, if any
    pub issued_by_order: Option<i64>,
    /// RFC 3339
    pub created_at: String,
}

impl GiftCard {
    pub fn remaining(&self) -> f64 {
        crate::money::to_f64(
            crate::money::to_decimal(self.amount) - crate::money::to_decimal(self.consumed_amount),
        )
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() <= 0.0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(created) => {
                now.signed_duration_since(created.with_timezone(&Utc))
                    > Duration::days(GIFT_CARD_VALIDITY_DAYS)
            }
            // Unparseable creation date: treat as expired rather than spendable
            Err(_) => true,
        }
    }
}
