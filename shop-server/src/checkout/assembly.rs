//! Order assembly: cart snapshot + checkout inputs → fully priced Order
//!
//! Pure given pre-fetched inputs: no persistence happens here, so a failed
//! assembly never leaves a partial order behind. The same computation backs
//! both the quote endpoint and the real submission.
//!
//! The promotion discount is threaded through as a *rate* (amount ÷
//! discountable base) applied independently to the subtotal, every tax
//! bucket and every line total, so the discounted lines re-sum to the
//! discounted subtotal instead of drifting cent by cent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::checkout::Address;
use shared::error::CheckoutErrorCode;
use shared::models::cart::{PricedCart, PricedItemKind};
use shared::models::order::{OrderStatus, PaymentMethod, WorkflowStep};
use surrealdb::RecordId;

use crate::checkout::gift_cards::{self, GiftCardBalance};
use crate::checkout::promotion::{self, EvaluatedPromotion};
use crate::checkout::CheckoutError;
use crate::db::models::{
    Customer, Order, OrderExtras, OrderItem, OrderTotals, PromotionCode, PromotionSnapshot,
    ResolvedChoice, ShippingLine,
};
use crate::money::{to_decimal, to_f64, round2, VatRate};
use crate::pricing::CatalogSnapshot;
use crate::services::offers::ShopOffers;

/// Shipping price resolved by the quote collaborator for the selection
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingQuote {
    pub carrier: String,
    pub offer: String,
    pub country: String,
    pub pickup_point: Option<String>,
    pub price_tax_included: f64,
}

/// Everything assembly needs, pre-fetched by the caller
pub struct AssemblyInput<'a> {
    pub cart: &'a PricedCart,
    pub catalog: &'a CatalogSnapshot,
    pub customer: Customer,
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub promotion: Option<&'a PromotionCode>,
    /// Validated spendable balances, in spending order
    pub gift_cards: Vec<GiftCardBalance>,
    pub shipping: ShippingQuote,
    pub offers: &'a ShopOffers,
    pub vat: VatRate,
    pub reduced_lead_time: bool,
    pub next_reference: i64,
    pub now: DateTime<Utc>,
}

/// Assemble an order draft. Steps, in order, each affecting the running
/// totals: promotion discount, paid extras, shipping (with free-shipping
/// override), free-gift flag, rounding, gift-card allocation, customization
/// resolution, reference assignment.
pub fn assemble(input: AssemblyInput<'_>) -> Result<Order, CheckoutError> {
    let cart = input.cart;
    if cart.is_empty() {
        return Err(CheckoutErrorCode::EmptyCart.into());
    }

    let has_customized = cart
        .items
        .iter()
        .any(|i| matches!(i.item, PricedItemKind::Customized { .. }));
    if has_customized && !input.offers.customized_enabled {
        return Err(CheckoutErrorCode::CustomizedOrdersDisabled.into());
    }
    if input.reduced_lead_time && !input.offers.reduced_lead_time_enabled {
        return Err(CheckoutErrorCode::ReducedLeadTimeDisabled.into());
    }

    // Paid extras enter before promotion evaluation: they count toward the
    // code's minimum-amount condition but are never discounted.
    let extras_total = if input.reduced_lead_time {
        round2(to_decimal(input.offers.reduced_lead_time_price))
    } else {
        Decimal::ZERO
    };

    let evaluated = match input.promotion {
        Some(code) => promotion::evaluate(code, cart, to_f64(extras_total), input.now)
            .map_err(CheckoutError::Rejected)?,
        None => EvaluatedPromotion::default(),
    };

    let base = to_decimal(cart.sub_total_excluding_gift_cards());
    let discount = to_decimal(evaluated.amount);
    // The rate is kept unrounded; only its applications are rounded
    let rate = if base > Decimal::ZERO && discount > Decimal::ZERO {
        discount / base
    } else {
        Decimal::ZERO
    };
    let keep = Decimal::ONE - rate;

    let sub_total = to_decimal(cart.sub_total_tax_included);
    let discounted_sub_total = round2(sub_total - discount);
    let discounted_base = round2(base - discount);

    let discounted_taxes = cart
        .taxes
        .iter()
        .map(|(rate_key, amount)| (rate_key.clone(), to_f64(round2(to_decimal(*amount) * keep))))
        .collect();

    let extras_tax = input.vat.tax_in_gross(extras_total);

    // Free shipping: promotion override, or the post-discount gift-card-
    // excluded subtotal crossing the configured threshold for an eligible
    // carrier/country. The quoted price is kept for invoicing either way.
    let shipping_original = round2(to_decimal(input.shipping.price_tax_included));
    let threshold_free = input.offers.free_shipping.as_ref().is_some_and(|rule| {
        rule.carrier == input.shipping.carrier
            && rule.countries.iter().any(|c| c == &input.shipping.country)
            && discounted_base >= to_decimal(rule.threshold)
    });
    let shipping_free = evaluated.free_shipping || threshold_free;
    let shipping_charged = if shipping_free {
        Decimal::ZERO
    } else {
        shipping_original
    };

    let free_gift = input
        .offers
        .gift_threshold
        .is_some_and(|threshold| discounted_base >= to_decimal(threshold));

    let total = round2(discounted_sub_total + shipping_charged + extras_total);

    // Gift cards reduce what is charged, never the order total itself
    let allocation = gift_cards::allocate(&input.gift_cards, to_f64(total));
    let amount_due = round2(total - to_decimal(allocation.total_covered));

    let items = resolve_items(cart, input.catalog, keep, input.vat)?;

    let promotion_snapshot = input.promotion.map(|code| PromotionSnapshot {
        code: code.code.clone(),
        amount: if evaluated.free_shipping {
            to_f64(shipping_original)
        } else {
            evaluated.amount
        },
        free_shipping: evaluated.free_shipping,
    });

    let extras = input.reduced_lead_time.then(|| OrderExtras {
        reduced_lead_time: true,
        tax_included: to_f64(extras_total),
        tax: to_f64(extras_tax),
    });

    Ok(Order {
        id: None,
        reference: input.next_reference,
        status: OrderStatus::Draft,
        workflow_step: WorkflowStep::Production,
        customer: input.customer,
        totals: OrderTotals {
            sub_total_tax_included: to_f64(sub_total),
            discounted_sub_total_tax_included: to_f64(discounted_sub_total),
            taxes: cart.taxes.clone(),
            discounted_taxes,
            total_tax_included: to_f64(total),
            amount_due: to_f64(amount_due),
            total_weight_grams: cart.total_weight_grams,
        },
        items,
        shipping: ShippingLine {
            carrier: input.shipping.carrier,
            offer: input.shipping.offer,
            country: input.shipping.country,
            pickup_point: input.shipping.pickup_point,
            tax_included: to_f64(shipping_charged),
            original_tax_included: to_f64(shipping_original),
            free: shipping_free,
            label_url: None,
        },
        billing: crate::db::models::BillingInfo {
            address: input.address,
            payment_method: input.payment_method,
            gift_cards: allocation.per_card,
            session_id: None,
        },
        promotion: promotion_snapshot,
        extras,
        free_gift,
        invoice_url: None,
        created_at: input.now.to_rfc3339(),
        paid_at: None,
    })
}

/// Turn priced lines into self-contained order items: the discount rate is
/// applied per line, and every customization reference is resolved to its
/// display name; an order is never re-resolved against the catalog again.
fn resolve_items(
    cart: &PricedCart,
    catalog: &CatalogSnapshot,
    keep: Decimal,
    vat: VatRate,
) -> Result<Vec<OrderItem>, CheckoutError> {
    let mut items = Vec::with_capacity(cart.items.len());

    for line in &cart.items {
        let original_total = to_decimal(line.line_total);
        let item = match &line.item {
            PricedItemKind::Customized { choices, .. } => {
                let mut customizations = Vec::with_capacity(choices.len());
                for choice in choices {
                    let name = catalog
                        .part_name(choice.kind, &choice.reference)
                        .ok_or(CheckoutError::Rejected(
                            CheckoutErrorCode::CustomizationUnavailable,
                        ))?;
                    customizations.push(ResolvedChoice {
                        slot: choice.slot.clone(),
                        kind: choice.kind,
                        name: name.to_string(),
                    });
                }
                let total = round2(original_total * keep);
                OrderItem::Customized {
                    article_name: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    total: to_f64(total),
                    original_total: to_f64(original_total),
                    weight_grams: line.weight_grams,
                    tax: to_f64(vat.tax_in_gross(total)),
                    customizations,
                    image: line.image.clone(),
                }
            }
            PricedItemKind::InStock { sku } => {
                let sku: RecordId = sku
                    .parse()
                    .map_err(|_| CheckoutError::Integrity(format!("invalid sku id: {sku}")))?;
                let total = round2(original_total * keep);
                OrderItem::InStock {
                    sku,
                    name: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    total: to_f64(total),
                    original_total: to_f64(original_total),
                    weight_grams: line.weight_grams,
                    tax: to_f64(vat.tax_in_gross(total)),
                    image: line.image.clone(),
                }
            }
            PricedItemKind::GiftCard {
                amount,
                recipient_email,
                recipient_name,
                message,
            } => OrderItem::GiftCard {
                amount: *amount,
                recipient_email: recipient_email.clone(),
                recipient_name: recipient_name.clone(),
                message: message.clone(),
            },
        };
        items.push(item);
    }

    Ok(items)
}
