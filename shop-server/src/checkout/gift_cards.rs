//! Gift card allocation
//!
//! Consumes available balances sequentially against an order total. The
//! caller pre-filters to cards owned by the paying user, unexpired and
//! unexhausted; this module only does the arithmetic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::CheckoutErrorCode;

use crate::db::models::GiftCard;
use crate::money::{to_decimal, to_f64};

/// A spendable card balance, in caller-supplied spending order
#[derive(Debug, Clone, PartialEq)]
pub struct GiftCardBalance {
    /// Record id ("gift_card:xyz")
    pub id: String,
    pub remaining: f64,
}

/// Result of allocating balances against an order total
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Allocation {
    /// Card id → amount consumed by this order
    pub per_card: BTreeMap<String, f64>,
    pub total_covered: f64,
}

/// Consume `min(remaining, still owed)` from each card in order, stopping
/// early once the total is covered. No card is over-consumed and the sum of
/// allocations never exceeds `order_total`.
pub fn allocate(cards: &[GiftCardBalance], order_total: f64) -> Allocation {
    let mut owed = to_decimal(order_total).max(Decimal::ZERO);
    let mut per_card = BTreeMap::new();
    let mut covered = Decimal::ZERO;

    for card in cards {
        if owed <= Decimal::ZERO {
            break;
        }
        let take = to_decimal(card.remaining).min(owed);
        if take <= Decimal::ZERO {
            continue;
        }
        owed -= take;
        covered += take;
        per_card.insert(card.id.clone(), to_f64(take));
    }

    Allocation {
        per_card,
        total_covered: to_f64(covered),
    }
}

/// Check ownership/expiry/exhaustion of the cards a customer wants to spend
/// and turn them into spendable balances, preserving the supplied order.
pub fn usable_balances(
    cards: &[GiftCard],
    owner: &str,
    now: DateTime<Utc>,
) -> Result<Vec<GiftCardBalance>, CheckoutErrorCode> {
    let mut balances = Vec::with_capacity(cards.len());
    for card in cards {
        if card.owner.as_deref() != Some(owner) {
            return Err(CheckoutErrorCode::GiftCardWrongOwner);
        }
        if card.is_expired(now) {
            return Err(CheckoutErrorCode::GiftCardExpired);
        }
        if card.is_exhausted() {
            return Err(CheckoutErrorCode::GiftCardExhausted);
        }
        let id = card
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or(CheckoutErrorCode::GiftCardUnknown)?;
        balances.push(GiftCardBalance {
            id,
            remaining: card.remaining(),
        });
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::RecordId;

    fn balance(id: &str, remaining: f64) -> GiftCardBalance {
        GiftCardBalance {
            id: format!("gift_card:{id}"),
            remaining,
        }
    }

    fn card(key: &str, amount: f64, consumed: f64, owner: Option<&str>, created: &str) -> GiftCard {
        GiftCard {
            id: Some(RecordId::from_table_key("gift_card", key)),
            code: format!("GC-{key}"),
            amount,
            consumed_amount: consumed,
            owner: owner.map(String::from),
            recipient_email: "ada@example.com".to_string(),
            recipient_name: None,
            message: None,
            issued_by_order: None,
            created_at: created.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_two_cards_cover_total() {
        // €45 order, balances €20 and €30 → {a: 20, b: 25}
        let allocation = allocate(&[balance("a", 20.0), balance("b", 30.0)], 45.0);
        assert_eq!(allocation.per_card.get("gift_card:a"), Some(&20.0));
        assert_eq!(allocation.per_card.get("gift_card:b"), Some(&25.0));
        assert_eq!(allocation.total_covered, 45.0);
    }

    #[test]
    fn test_stops_early_once_covered() {
        let allocation = allocate(
            &[balance("a", 50.0), balance("b", 30.0), balance("c", 10.0)],
            40.0,
        );
        assert_eq!(allocation.per_card.len(), 1);
        assert_eq!(allocation.per_card.get("gift_card:a"), Some(&40.0));
        assert_eq!(allocation.total_covered, 40.0);
    }

    #[test]
    fn test_partial_coverage() {
        let allocation = allocate(&[balance("a", 12.5)], 40.0);
        assert_eq!(allocation.total_covered, 12.5);
        assert_eq!(allocation.per_card.get("gift_card:a"), Some(&12.5));
    }

    #[test]
    fn test_sum_never_exceeds_total_or_balances() {
        let cards = [balance("a", 7.3), balance("b", 11.11), balance("c", 100.0)];
        for total in [0.0, 5.0, 18.41, 18.42, 250.0] {
            let allocation = allocate(&cards, total);
            let sum: f64 = allocation.per_card.values().sum();
            assert!(sum <= total + f64::EPSILON);
            let available: f64 = cards.iter().map(|c| c.remaining).sum();
            assert!(crate::money::money_eq(
                allocation.total_covered,
                total.min(available)
            ));
        }
    }

    #[test]
    fn test_zero_total_allocates_nothing() {
        let allocation = allocate(&[balance("a", 20.0)], 0.0);
        assert!(allocation.per_card.is_empty());
        assert_eq!(allocation.total_covered, 0.0);
    }

    #[test]
    fn test_usable_balances_happy_path() {
        let cards = vec![
            card("a", 50.0, 30.0, Some("user-1"), "2026-01-01T00:00:00Z"),
            card("b", 20.0, 0.0, Some("user-1"), "2026-02-01T00:00:00Z"),
        ];
        let balances = usable_balances(&cards, "user-1", now()).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].remaining, 20.0);
        assert_eq!(balances[1].remaining, 20.0);
    }

    #[test]
    fn test_usable_balances_wrong_owner() {
        let cards = vec![card("a", 50.0, 0.0, Some("someone-else"), "2026-01-01T00:00:00Z")];
        assert_eq!(
            usable_balances(&cards, "user-1", now()),
            Err(CheckoutErrorCode::GiftCardWrongOwner)
        );
    }

    #[test]
    fn test_usable_balances_expired() {
        // Issued more than 365 days before `now`
        let cards = vec![card("a", 50.0, 0.0, Some("user-1"), "2024-06-01T00:00:00Z")];
        assert_eq!(
            usable_balances(&cards, "user-1", now()),
            Err(CheckoutErrorCode::GiftCardExpired)
        );
    }

    #[test]
    fn test_usable_balances_exhausted() {
        let cards = vec![card("a", 50.0, 50.0, Some("user-1"), "2026-01-01T00:00:00Z")];
        assert_eq!(
            usable_balances(&cards, "user-1", now()),
            Err(CheckoutErrorCode::GiftCardExhausted)
        );
    }
}
