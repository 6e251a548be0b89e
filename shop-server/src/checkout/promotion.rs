//! Promotion code evaluation
//!
//! Validates a code against a priced cart and computes the discount it
//! grants. Evaluation never mutates the usage counter; incrementing `used`
//! is a side effect of order finalization, so a quote never consumes usage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::CheckoutErrorCode;
use shared::models::cart::{PricedCart, PricedItemKind};

use crate::db::models::{Discount, PromotionCode};
use crate::money::{to_decimal, to_f64, round2};

/// What a valid code grants on this cart
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluatedPromotion {
    /// Discount on the gift-card-excluded subtotal, tax included.
    /// Zero for free-shipping codes; their value is the waived shipping.
    pub amount: f64,
    pub free_shipping: bool,
}

/// Evaluate `code` against the cart.
///
/// The discountable base is the subtotal excluding gift-card lines (face
/// value is never discounted). Paid extras count toward the minimum-amount
/// condition but are not discounted either.
pub fn evaluate(
    code: &PromotionCode,
    cart: &PricedCart,
    extras_total: f64,
    now: DateTime<Utc>,
) -> Result<EvaluatedPromotion, CheckoutErrorCode> {
    if let Some(limit) = code.usage_limit
        && code.used >= limit
    {
        return Err(CheckoutErrorCode::PromotionUsageReached);
    }

    if let Some(expires_at) = &code.expires_at {
        match DateTime::parse_from_rfc3339(expires_at) {
            Ok(expiry) if now <= expiry.with_timezone(&Utc) => {}
            // Past expiry, or an unparseable date nobody can honor
            _ => return Err(CheckoutErrorCode::PromotionExpired),
        }
    }

    let base = to_decimal(cart.sub_total_excluding_gift_cards());

    if let Some(minimum) = code.minimum_amount
        && base + to_decimal(extras_total) < to_decimal(minimum)
    {
        return Err(CheckoutErrorCode::PromotionBelowMinimum);
    }

    if !code.article_filter.is_empty() {
        let filter: Vec<String> = code.article_filter.iter().map(|id| id.to_string()).collect();
        let matches = cart.items.iter().any(|item| match &item.item {
            PricedItemKind::Customized { article, .. } => filter.contains(article),
            PricedItemKind::InStock { sku } => filter.contains(sku),
            PricedItemKind::GiftCard { .. } => false,
        });
        if !matches {
            return Err(CheckoutErrorCode::PromotionNotApplicable);
        }
    }

    let evaluated = match &code.discount {
        Discount::Percentage { value } => EvaluatedPromotion {
            amount: to_f64(round2(base * to_decimal(*value) / Decimal::ONE_HUNDRED)),
            free_shipping: false,
        },
        Discount::FixedAmount { value } => EvaluatedPromotion {
            // A fixed discount never exceeds the discountable base
            amount: to_f64(round2(to_decimal(*value).min(base))),
            free_shipping: false,
        },
        Discount::FreeShipping => EvaluatedPromotion {
            amount: 0.0,
            free_shipping: true,
        },
    };

    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::cart::PricedItem;
    use surrealdb::RecordId;

    fn cart_with(lines: Vec<(f64, bool)>) -> PricedCart {
        let items: Vec<PricedItem> = lines
            .iter()
            .enumerate()
            .map(|(i, (total, gift))| PricedItem {
                item: if *gift {
                    PricedItemKind::GiftCard {
                        amount: *total,
                        recipient_email: "ada@example.com".to_string(),
                        recipient_name: None,
                        message: None,
                    }
                } else {
                    PricedItemKind::Customized {
                        article: format!("article:a{i}"),
                        choices: vec![],
                    }
                },
                cart_index: i,
                description: String::new(),
                image: None,
                quantity: 1,
                unit_price: *total,
                line_total: *total,
                weight_grams: 0,
                tax: 0.0,
            })
            .collect();
        let sub_total = lines.iter().map(|(t, _)| t).sum();
        PricedCart {
            items,
            sub_total_tax_included: sub_total,
            taxes: Default::default(),
            total_weight_grams: 0,
        }
    }

    fn percentage_code(value: f64) -> PromotionCode {
        PromotionCode {
            id: Some(RecordId::from_table_key("promotion_code", "p1")),
            code: "TEN".to_string(),
            discount: Discount::Percentage { value },
            minimum_amount: None,
            expires_at: None,
            usage_limit: None,
            used: 0,
            article_filter: vec![],
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_percentage_discount_on_subtotal() {
        let cart = cart_with(vec![(60.0, false), (40.0, false)]);
        let result = evaluate(&percentage_code(10.0), &cart, 0.0, now()).unwrap();
        assert_eq!(result.amount, 10.0);
        assert!(!result.free_shipping);
    }

    #[test]
    fn test_gift_card_lines_excluded_from_base() {
        let cart = cart_with(vec![(60.0, false), (50.0, true)]);
        let result = evaluate(&percentage_code(10.0), &cart, 0.0, now()).unwrap();
        assert_eq!(result.amount, 6.0);
    }

    #[test]
    fn test_fixed_amount_capped_at_base() {
        let mut code = percentage_code(0.0);
        code.discount = Discount::FixedAmount { value: 80.0 };
        let cart = cart_with(vec![(60.0, false)]);
        let result = evaluate(&code, &cart, 0.0, now()).unwrap();
        assert_eq!(result.amount, 60.0);
    }

    #[test]
    fn test_free_shipping_has_zero_subtotal_discount() {
        let mut code = percentage_code(0.0);
        code.discount = Discount::FreeShipping;
        let cart = cart_with(vec![(60.0, false)]);
        let result = evaluate(&code, &cart, 0.0, now()).unwrap();
        assert_eq!(result.amount, 0.0);
        assert!(result.free_shipping);
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut code = percentage_code(10.0);
        code.usage_limit = Some(5);
        code.used = 5;
        let cart = cart_with(vec![(60.0, false)]);
        assert_eq!(
            evaluate(&code, &cart, 0.0, now()),
            Err(CheckoutErrorCode::PromotionUsageReached)
        );
    }

    #[test]
    fn test_expired_code() {
        let mut code = percentage_code(10.0);
        code.expires_at = Some("2026-01-01T00:00:00Z".to_string());
        let cart = cart_with(vec![(60.0, false)]);
        assert_eq!(
            evaluate(&code, &cart, 0.0, now()),
            Err(CheckoutErrorCode::PromotionExpired)
        );
    }

    #[test]
    fn test_minimum_counts_extras() {
        let mut code = percentage_code(10.0);
        code.minimum_amount = Some(70.0);
        let cart = cart_with(vec![(60.0, false)]);

        assert_eq!(
            evaluate(&code, &cart, 0.0, now()),
            Err(CheckoutErrorCode::PromotionBelowMinimum)
        );
        // A paid extra pushes the cart over the minimum
        assert!(evaluate(&code, &cart, 15.0, now()).is_ok());
    }

    #[test]
    fn test_article_filter() {
        let mut code = percentage_code(10.0);
        code.article_filter = vec![RecordId::from_table_key("article", "a0")];
        let matching = cart_with(vec![(60.0, false)]);
        assert!(evaluate(&code, &matching, 0.0, now()).is_ok());

        code.article_filter = vec![RecordId::from_table_key("article", "other")];
        assert_eq!(
            evaluate(&code, &matching, 0.0, now()),
            Err(CheckoutErrorCode::PromotionNotApplicable)
        );
    }

    #[test]
    fn test_evaluation_does_not_touch_used() {
        let code = percentage_code(10.0);
        let cart = cart_with(vec![(60.0, false)]);
        let before = code.used;
        let _ = evaluate(&code, &cart, 0.0, now()).unwrap();
        assert_eq!(code.used, before);
    }
}
