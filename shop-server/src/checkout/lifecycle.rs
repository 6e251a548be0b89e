//! Order lifecycle: draft creation, payment paths, finalization hooks
//!
//! Three ways into an order:
//!
//! - **Card**: persist DRAFT, open an external payment session, link the
//!   cart to the draft. Finalization arrives asynchronously via webhook.
//! - **Bank transfer**: persist directly as WAITING_BANK_TRANSFER; an
//!   admin later confirms reception.
//! - **Gift-card-only**: the balance covers everything; persist as PAID.
//!
//! The on-submitted effects (promotion usage, stock decrement, gift-card
//! consumption, cart deletion) ride the same transaction as the order
//! mutation. Post-paid side effects (emails, invoice, gift-card issuance,
//! CRM) are fire-and-forget: a successful payment is never rolled back for
//! a notification.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use shared::checkout::{CheckoutInput, CheckoutOutcome, CheckoutQuote};
use shared::error::CheckoutErrorCode;
use shared::models::order::{OrderStatus, PaymentMethod};
use surrealdb::RecordId;

use crate::auth::CurrentUser;
use crate::checkout::assembly::{self, AssemblyInput, ShippingQuote};
use crate::checkout::gift_cards;
use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::db::models::{Cart, Customer, GiftCard, Order, OrderItem};
use crate::db::repository::{
    gift_card::generate_gift_card_code, CartRepository, CatalogRepository, GiftCardRepository,
    OrderRepository, PromotionCodeRepository, SubmitEffects,
};
use crate::money::{to_decimal, VatRate};
use crate::pricing;
use crate::services::billing::{CompletedSession, SessionLineItem};
use crate::services::notify::{crm_event_logged, send_email_logged};

/// An assembled order plus everything needed to persist its side effects
struct PreparedCheckout {
    order: Order,
    promotion: Option<RecordId>,
}

/// Price, validate and assemble without persisting anything
async fn prepare(
    state: &ServerState,
    user: &CurrentUser,
    input: &CheckoutInput,
    next_reference: i64,
) -> Result<PreparedCheckout, CheckoutError> {
    let db = state.get_db();
    let cart_repo = CartRepository::new(db.clone());
    let catalog_repo = CatalogRepository::new(db.clone());

    let cart = cart_repo
        .find(&user.id)
        .await?
        .ok_or(CheckoutError::Rejected(CheckoutErrorCode::EmptyCart))?;

    let vat = VatRate::new(state.config.vat_rate);
    let catalog = catalog_repo.snapshot(&cart.items).await?;
    let priced = pricing::price_cart(&cart.items, &catalog, vat);

    let promotion = match &input.promotion_code {
        Some(code) => Some(
            PromotionCodeRepository::new(db.clone())
                .find_by_code(code)
                .await?
                .ok_or(CheckoutError::Rejected(CheckoutErrorCode::PromotionUnknown))?,
        ),
        None => None,
    };

    let now = Utc::now();
    let gift_card_repo = GiftCardRepository::new(db.clone());
    let mut cards = Vec::with_capacity(input.gift_cards.len());
    for raw_id in &input.gift_cards {
        let id: RecordId = raw_id
            .parse()
            .map_err(|_| CheckoutError::Rejected(CheckoutErrorCode::GiftCardUnknown))?;
        let card = gift_card_repo
            .find_by_id(&id)
            .await?
            .ok_or(CheckoutError::Rejected(CheckoutErrorCode::GiftCardUnknown))?;
        cards.push(card);
    }
    let balances =
        gift_cards::usable_balances(&cards, &user.id, now).map_err(CheckoutError::Rejected)?;

    let offers = state.services.offers.current().await?;

    // Checkout fails loudly when the quote service is down: nothing has
    // been persisted yet.
    let shipping_offer = state
        .services
        .shipping
        .get_price(
            &input.shipping.carrier,
            &input.shipping.offer,
            priced.total_weight_grams,
            &input.shipping.country,
        )
        .await?;

    let order = assembly::assemble(AssemblyInput {
        cart: &priced,
        catalog: &catalog,
        customer: Customer {
            user: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        },
        address: input.billing_address.clone(),
        payment_method: input.payment_method,
        promotion: promotion.as_ref(),
        gift_cards: balances,
        shipping: ShippingQuote {
            carrier: input.shipping.carrier.clone(),
            offer: input.shipping.offer.clone(),
            country: input.shipping.country.clone(),
            pickup_point: input.shipping.pickup_point.clone(),
            price_tax_included: shipping_offer.price_tax_included,
        },
        offers: &offers,
        vat,
        reduced_lead_time: input.extras.reduced_lead_time,
        next_reference,
        now,
    })?;

    Ok(PreparedCheckout {
        order,
        promotion: promotion.and_then(|p| p.id),
    })
}

/// Pre-checkout preview: the full breakdown, no persistence, no counters
pub async fn quote(
    state: &ServerState,
    user: &CurrentUser,
    input: &CheckoutInput,
) -> Result<CheckoutQuote, CheckoutError> {
    let next_reference = OrderRepository::new(state.get_db()).next_reference().await?;
    let prepared = prepare(state, user, input, next_reference).await?;
    Ok(quote_of(&prepared.order))
}

fn quote_of(order: &Order) -> CheckoutQuote {
    CheckoutQuote {
        sub_total_tax_included: order.totals.sub_total_tax_included,
        discounted_sub_total_tax_included: order.totals.discounted_sub_total_tax_included,
        discount_amount: order
            .promotion
            .as_ref()
            .filter(|p| !p.free_shipping)
            .map(|p| p.amount)
            .unwrap_or(0.0),
        taxes: order.totals.discounted_taxes.clone(),
        shipping_tax_included: order.shipping.tax_included,
        shipping_original_tax_included: order.shipping.original_tax_included,
        extras_tax_included: order.extras.as_ref().map(|e| e.tax_included).unwrap_or(0.0),
        total_tax_included: order.totals.total_tax_included,
        gift_cards: order.billing.gift_cards.clone(),
        amount_due: order.totals.amount_due,
        free_gift: order.free_gift,
    }
}

/// Submit the checkout: assemble, persist through the path the payment
/// method selects, and run the submission hooks.
pub async fn submit(
    state: &ServerState,
    user: &CurrentUser,
    input: &CheckoutInput,
) -> Result<CheckoutOutcome, CheckoutError> {
    // At most one live payment attempt per cart
    super::guard::cancel_superseded_draft(state, &user.id).await?;

    let order_repo = OrderRepository::new(state.get_db());
    let next_reference = order_repo.next_reference().await?;
    let prepared = prepare(state, user, input, next_reference).await?;

    let fully_covered = prepared.order.totals.amount_due <= 0.0;
    if fully_covered {
        submit_gift_card_only(state, user, prepared).await
    } else {
        match input.payment_method {
            PaymentMethod::BankTransfer => submit_bank_transfer(state, user, prepared).await,
            PaymentMethod::Card => submit_card(state, user, prepared).await,
            // A gift-card submission that does not cover the total has
            // nothing to charge the rest against
            PaymentMethod::GiftCard => {
                Err(CheckoutError::Rejected(CheckoutErrorCode::GiftCardExhausted))
            }
        }
    }
}

/// Effects applied together with the order mutation
fn submit_effects(order: &Order, promotion: Option<RecordId>) -> SubmitEffects {
    let stock = order
        .items
        .iter()
        .filter_map(|item| match item {
            OrderItem::InStock { sku, quantity, .. } => Some((sku.clone(), *quantity as i64)),
            _ => None,
        })
        .collect();
    let gift_cards = order
        .billing
        .gift_cards
        .iter()
        .filter_map(|(id, amount)| id.parse::<RecordId>().ok().map(|rid| (rid, *amount)))
        .collect();

    SubmitEffects {
        cart: Some(Cart::record_id(&order.customer.user)),
        promotion,
        gift_cards,
        stock,
    }
}

async fn submit_gift_card_only(
    state: &ServerState,
    user: &CurrentUser,
    mut prepared: PreparedCheckout,
) -> Result<CheckoutOutcome, CheckoutError> {
    prepared.order.status = OrderStatus::Paid;
    prepared.order.paid_at = Some(Utc::now().to_rfc3339());
    prepared.order.billing.payment_method = PaymentMethod::GiftCard;

    let effects = submit_effects(&prepared.order, prepared.promotion);
    let order = OrderRepository::new(state.get_db())
        .create_submitted(&prepared.order, &effects)
        .await?;

    on_submitted(state, user, &order).await;
    on_paid(state, &order).await;

    Ok(CheckoutOutcome::Paid {
        order_reference: order.reference,
    })
}

async fn submit_bank_transfer(
    state: &ServerState,
    user: &CurrentUser,
    mut prepared: PreparedCheckout,
) -> Result<CheckoutOutcome, CheckoutError> {
    prepared.order.status = OrderStatus::WaitingBankTransfer;

    let effects = submit_effects(&prepared.order, prepared.promotion);
    let order = OrderRepository::new(state.get_db())
        .create_submitted(&prepared.order, &effects)
        .await?;

    on_submitted(state, user, &order).await;

    Ok(CheckoutOutcome::BankTransfer {
        order_reference: order.reference,
        amount_due: order.totals.amount_due,
    })
}

async fn submit_card(
    state: &ServerState,
    user: &CurrentUser,
    prepared: PreparedCheckout,
) -> Result<CheckoutOutcome, CheckoutError> {
    let order_repo = OrderRepository::new(state.get_db());
    let cart_repo = CartRepository::new(state.get_db());

    let draft = order_repo.insert_draft(&prepared.order).await?;
    let draft_id = draft
        .id
        .clone()
        .ok_or_else(|| CheckoutError::Integrity("draft created without id".to_string()))?;

    let discount_cents = draft
        .promotion
        .as_ref()
        .filter(|p| !p.free_shipping)
        .map(|p| cents(p.amount))
        .unwrap_or(0);
    let gift_card_cents: i64 = draft.billing.gift_cards.values().map(|v| cents(*v)).sum();

    let session = match state
        .services
        .billing
        .create_session(
            draft.reference,
            &user.email,
            &session_line_items(&draft),
            discount_cents,
            gift_card_cents,
        )
        .await
    {
        Ok(session) => session,
        Err(e) => {
            // Fail loudly with nothing durable left behind
            order_repo.delete(&draft_id).await?;
            return Err(e.into());
        }
    };

    order_repo.set_session(&draft_id, &session.id).await?;
    cart_repo.set_draft(&user.id, draft_id).await?;

    Ok(CheckoutOutcome::Card {
        order_reference: draft.reference,
        payment_url: session.url,
    })
}

fn cents(amount: f64) -> i64 {
    (to_decimal(amount) * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .unwrap_or(0)
}

/// Displayed lines for the hosted payment page: pre-discount item totals,
/// charged shipping and extras. The provider applies discount/gift-card
/// adjustments on top.
fn session_line_items(order: &Order) -> Vec<SessionLineItem> {
    let mut lines: Vec<SessionLineItem> = order
        .items
        .iter()
        .map(|item| match item {
            OrderItem::Customized {
                article_name,
                quantity,
                original_total,
                ..
            } => SessionLineItem {
                name: article_name.clone(),
                quantity: *quantity,
                amount_cents: cents(*original_total),
            },
            OrderItem::InStock {
                name,
                quantity,
                original_total,
                ..
            } => SessionLineItem {
                name: name.clone(),
                quantity: *quantity,
                amount_cents: cents(*original_total),
            },
            OrderItem::GiftCard { amount, .. } => SessionLineItem {
                name: "Gift card".to_string(),
                quantity: 1,
                amount_cents: cents(*amount),
            },
        })
        .collect();

    if order.shipping.tax_included > 0.0 {
        lines.push(SessionLineItem {
            name: "Shipping".to_string(),
            quantity: 1,
            amount_cents: cents(order.shipping.tax_included),
        });
    }
    if let Some(extras) = &order.extras {
        lines.push(SessionLineItem {
            name: "Reduced lead time".to_string(),
            quantity: 1,
            amount_cents: cents(extras.tax_included),
        });
    }
    lines
}

/// Card-path finalization, triggered by a completed-session webhook event.
/// The DRAFT-status guard in the transaction rejects replays.
pub async fn finalize_card_payment(
    state: &ServerState,
    completed: &CompletedSession,
) -> Result<Order, CheckoutError> {
    let db = state.get_db();
    let order_repo = OrderRepository::new(db.clone());

    let order = order_repo
        .find_by_reference(completed.order_reference)
        .await?
        .ok_or_else(|| {
            CheckoutError::Conflict(format!(
                "No order with reference {}",
                completed.order_reference
            ))
        })?;

    // Re-resolve the promotion record; the snapshot keeps the order
    // self-contained but the counter lives on the live record.
    let promotion = match &order.promotion {
        Some(snapshot) => PromotionCodeRepository::new(db.clone())
            .find_by_code(&snapshot.code)
            .await?
            .and_then(|p| p.id),
        None => None,
    };

    let effects = submit_effects(&order, promotion);
    let finalized = order_repo
        .finalize_card(completed.order_reference, &effects)
        .await?;

    // Payment is already captured: an oversell here is logged, never rolled
    // back (documented gap: stock checks are best-effort, not a
    // reservation).
    for (sku, quantity) in &effects.stock {
        match order_repo.decrement_stock(sku, *quantity).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(
                    order = finalized.reference,
                    sku = %sku,
                    quantity,
                    "Stock decrement matched zero rows after card payment"
                );
            }
            Err(e) => {
                tracing::error!(order = finalized.reference, sku = %sku, error = %e,
                    "Stock decrement failed after card payment");
            }
        }
    }

    let user = CurrentUser {
        id: finalized.customer.user.clone(),
        email: finalized.customer.email.clone(),
        name: finalized.customer.name.clone(),
        role: "customer".to_string(),
    };
    on_submitted(state, &user, &finalized).await;
    on_paid(state, &finalized).await;

    Ok(finalized)
}

/// Admin confirmation that a bank transfer arrived
pub async fn confirm_bank_transfer(
    state: &ServerState,
    reference: i64,
) -> Result<Order, CheckoutError> {
    let order = OrderRepository::new(state.get_db())
        .confirm_bank_transfer(reference)
        .await?;
    on_paid(state, &order).await;
    Ok(order)
}

/// Regenerate a missing/lost invoice for a paid order
pub async fn regenerate_invoice(
    state: &ServerState,
    reference: i64,
) -> Result<String, CheckoutError> {
    let order_repo = OrderRepository::new(state.get_db());
    let order = order_repo
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| CheckoutError::Conflict(format!("No order with reference {reference}")))?;
    if order.status != OrderStatus::Paid {
        return Err(CheckoutError::Conflict(format!(
            "Order {reference} is not paid"
        )));
    }
    let url = state.services.invoices.generate(&order).await?;
    order_repo.set_invoice_url(reference, &url).await?;
    Ok(url)
}

/// Shared "on submitted" notifications and media promotion. The counter
/// moves already happened inside the submission transaction.
async fn on_submitted(state: &ServerState, user: &CurrentUser, order: &Order) {
    if let Err(e) = state
        .services
        .media
        .promote_cart_media(&user.id, order.reference)
        .await
    {
        tracing::warn!(order = order.reference, error = %e, "Cart media promotion failed");
    }

    let notifier = state.services.notifier.as_ref();
    send_email_logged(
        notifier,
        &state.config.admin_email,
        "order_submitted_admin",
        &serde_json::json!({
            "reference": order.reference,
            "total": order.totals.total_tax_included,
            "customer": order.customer.email,
        }),
    )
    .await;

    if order.billing.payment_method == PaymentMethod::BankTransfer {
        send_email_logged(
            notifier,
            &order.customer.email,
            "bank_transfer_instructions",
            &serde_json::json!({
                "reference": order.reference,
                "amount_due": order.totals.amount_due,
            }),
        )
        .await;
    }
}

/// "On paid" side effects: exactly once per order, tolerant of failure
async fn on_paid(state: &ServerState, order: &Order) {
    let notifier = state.services.notifier.as_ref();

    send_email_logged(
        notifier,
        &order.customer.email,
        "payment_received",
        &serde_json::json!({
            "reference": order.reference,
            "total": order.totals.total_tax_included,
        }),
    )
    .await;

    // Invoice generation failure is swallowed: the order stays valid and
    // the document is regenerable later.
    match state.services.invoices.generate(order).await {
        Ok(url) => {
            if let Err(e) = OrderRepository::new(state.get_db())
                .set_invoice_url(order.reference, &url)
                .await
            {
                tracing::warn!(order = order.reference, error = %e, "Invoice URL not stored");
            }
        }
        Err(e) => {
            tracing::warn!(order = order.reference, error = %e, "Invoice generation failed");
        }
    }

    issue_purchased_gift_cards(state, order).await;

    crm_event_logged(
        notifier,
        "order_paid",
        &serde_json::json!({
            "reference": order.reference,
            "email": order.customer.email,
            "total": order.totals.total_tax_included,
        }),
    )
    .await;
}

/// Create gift-card records for every purchased card and notify recipients
async fn issue_purchased_gift_cards(state: &ServerState, order: &Order) {
    let repo = GiftCardRepository::new(state.get_db());
    for item in &order.items {
        let OrderItem::GiftCard {
            amount,
            recipient_email,
            recipient_name,
            message,
        } = item
        else {
            continue;
        };

        let card = GiftCard {
            id: None,
            code: generate_gift_card_code(),
            amount: *amount,
            consumed_amount: 0.0,
            owner: None,
            recipient_email: recipient_email.clone(),
            recipient_name: recipient_name.clone(),
            message: message.clone(),
            issued_by_order: Some(order.reference),
            created_at: Utc::now().to_rfc3339(),
        };

        match repo.create(card).await {
            Ok(created) => {
                send_email_logged(
                    state.services.notifier.as_ref(),
                    recipient_email,
                    "gift_card_issued",
                    &serde_json::json!({
                        "code": created.code,
                        "amount": created.amount,
                        "message": created.message,
                        "from_order": order.reference,
                    }),
                )
                .await;
            }
            Err(e) => {
                tracing::error!(order = order.reference, recipient = recipient_email,
                    error = %e, "Purchased gift card was not issued");
            }
        }
    }
}

#[cfg(test)]
mod tests;
