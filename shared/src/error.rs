//! Machine-readable checkout rejection codes
//!
//! Stable codes surfaced to the storefront so the UI can map a rejected
//! checkout attempt to a localized message. Nothing is persisted when one of
//! these is returned.

use serde::{Deserialize, Serialize};

/// Reasons a cart mutation or checkout attempt is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutErrorCode {
    /// Cart holds zero priced items after the read-time projection
    EmptyCart,
    /// Promotion code does not exist
    PromotionUnknown,
    /// Promotion code past its expiry date
    PromotionExpired,
    /// Promotion code usage limit reached
    PromotionUsageReached,
    /// Cart subtotal (including paid extras) below the code minimum
    PromotionBelowMinimum,
    /// Code restricted to articles the cart does not contain
    PromotionNotApplicable,
    /// Gift card id does not exist
    GiftCardUnknown,
    /// Gift card belongs to another customer
    GiftCardWrongOwner,
    /// Gift card older than 365 days
    GiftCardExpired,
    /// Gift card balance fully consumed
    GiftCardExhausted,
    /// A referenced fabric/piping/embroidery color vanished or is disabled
    CustomizationUnavailable,
    /// Made-to-order articles are switched off shop-wide
    CustomizedOrdersDisabled,
    /// Paid lead-time reduction is switched off shop-wide
    ReducedLeadTimeDisabled,
    /// Requested quantity exceeds live stock
    StockConflict,
    /// Order not in the state the operation expects (e.g. webhook replay)
    OrderStateConflict,
    /// Shipping quote service failed or returned no offer
    ShippingUnavailable,
    /// Billing session could not be created
    BillingUnavailable,
}

impl CheckoutErrorCode {
    /// Stable string form (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyCart => "EMPTY_CART",
            Self::PromotionUnknown => "PROMOTION_UNKNOWN",
            Self::PromotionExpired => "PROMOTION_EXPIRED",
            Self::PromotionUsageReached => "PROMOTION_USAGE_REACHED",
            Self::PromotionBelowMinimum => "PROMOTION_BELOW_MINIMUM",
            Self::PromotionNotApplicable => "PROMOTION_NOT_APPLICABLE",
            Self::GiftCardUnknown => "GIFT_CARD_UNKNOWN",
            Self::GiftCardWrongOwner => "GIFT_CARD_WRONG_OWNER",
            Self::GiftCardExpired => "GIFT_CARD_EXPIRED",
            Self::GiftCardExhausted => "GIFT_CARD_EXHAUSTED",
            Self::CustomizationUnavailable => "CUSTOMIZATION_UNAVAILABLE",
            Self::CustomizedOrdersDisabled => "CUSTOMIZED_ORDERS_DISABLED",
            Self::ReducedLeadTimeDisabled => "REDUCED_LEAD_TIME_DISABLED",
            Self::StockConflict => "STOCK_CONFLICT",
            Self::OrderStateConflict => "ORDER_STATE_CONFLICT",
            Self::ShippingUnavailable => "SHIPPING_UNAVAILABLE",
            Self::BillingUnavailable => "BILLING_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for CheckoutErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
