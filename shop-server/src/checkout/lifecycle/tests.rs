use std::sync::atomic::Ordering;

use super::*;
use shared::checkout::{Address, ExtrasInput, ShippingSelection};
use shared::models::cart::CartItemInput;

use crate::checkout::guard;
use crate::db::models::{BillingInfo, OrderTotals, PromotionCode, ShippingLine, StockSku};
use crate::db::models::promotion_code::Discount;
use crate::db::repository::RepoError;
use crate::db::DbService;
use crate::services::mock::{mocked_services, MockHandles};
use crate::services::offers::ShopOffers;

async fn test_state(offers: ShopOffers) -> (ServerState, MockHandles) {
    let db = DbService::memory().await.unwrap().db;
    let (services, handles) = mocked_services(offers);
    let state = ServerState::new(crate::core::Config::from_env(), db, services);
    (state, handles)
}

fn test_user() -> CurrentUser {
    CurrentUser {
        id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
        role: "customer".to_string(),
    }
}

fn address() -> Address {
    Address {
        name: "Ada Lovelace".to_string(),
        line1: "12 rue des Lices".to_string(),
        line2: None,
        zip_code: "49100".to_string(),
        city: "Angers".to_string(),
        country: "FR".to_string(),
    }
}

fn checkout_input(payment_method: PaymentMethod) -> CheckoutInput {
    CheckoutInput {
        shipping: ShippingSelection {
            carrier: "COLISSIMO".to_string(),
            offer: "home".to_string(),
            country: "FR".to_string(),
            pickup_point: None,
        },
        billing_address: address(),
        payment_method,
        promotion_code: None,
        gift_cards: vec![],
        extras: ExtrasInput::default(),
    }
}

async fn seed_sku(state: &ServerState, key: &str, price: f64, stock: i64) {
    let sku = StockSku {
        id: None,
        name: format!("Sku {key}"),
        description: None,
        price,
        weight_grams: 100,
        stock,
        enabled: true,
        image: None,
    };
    let _: Option<StockSku> = state
        .get_db()
        .create(("stock_sku", key))
        .content(sku)
        .await
        .unwrap();
}

async fn sku_stock(state: &ServerState, key: &str) -> i64 {
    let sku: Option<StockSku> = state.get_db().select(("stock_sku", key)).await.unwrap();
    sku.unwrap().stock
}

async fn seed_promotion(state: &ServerState, key: &str, code: &str, percent: f64) {
    let promo = PromotionCode {
        id: None,
        code: code.to_string(),
        discount: Discount::Percentage { value: percent },
        minimum_amount: None,
        expires_at: None,
        usage_limit: None,
        used: 0,
        article_filter: vec![],
    };
    let _: Option<PromotionCode> = state
        .get_db()
        .create(("promotion_code", key))
        .content(promo)
        .await
        .unwrap();
}

async fn promotion_used(state: &ServerState, key: &str) -> i64 {
    let promo: Option<PromotionCode> = state
        .get_db()
        .select(("promotion_code", key))
        .await
        .unwrap();
    promo.unwrap().used
}

async fn seed_gift_card(state: &ServerState, key: &str, amount: f64, owner: &str) {
    let card = GiftCard {
        id: None,
        code: format!("GC-{key}"),
        amount,
        consumed_amount: 0.0,
        owner: Some(owner.to_string()),
        recipient_email: "ada@example.com".to_string(),
        recipient_name: None,
        message: None,
        issued_by_order: None,
        created_at: Utc::now().to_rfc3339(),
    };
    let _: Option<GiftCard> = state
        .get_db()
        .create(("gift_card", key))
        .content(card)
        .await
        .unwrap();
}

async fn fill_cart_in_stock(state: &ServerState, user: &str, sku_key: &str, quantity: i32) {
    let item = crate::db::models::CartItem::from_input(CartItemInput::InStock {
        sku: format!("stock_sku:{sku_key}"),
        quantity,
    })
    .unwrap();
    CartRepository::new(state.get_db())
        .add_item(user, item)
        .await
        .unwrap();
}

async fn fill_cart_gift_card(state: &ServerState, user: &str, amount: f64) {
    let item = crate::db::models::CartItem::from_input(CartItemInput::GiftCard {
        amount,
        recipient_email: "friend@example.com".to_string(),
        recipient_name: Some("Grace".to_string()),
        message: None,
    })
    .unwrap();
    CartRepository::new(state.get_db())
        .add_item(user, item)
        .await
        .unwrap();
}

fn emails_of(handles: &MockHandles) -> Vec<(String, String)> {
    handles.notifier.emails.lock().unwrap().clone()
}

// =============================================================================
// Bank transfer path
// =============================================================================

#[tokio::test]
async fn test_bank_transfer_submission() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    let outcome = submit(&state, &user, &checkout_input(PaymentMethod::BankTransfer))
        .await
        .unwrap();

    // 24.00 items + 6.90 shipping
    assert_eq!(
        outcome,
        CheckoutOutcome::BankTransfer {
            order_reference: 1,
            amount_due: 30.9
        }
    );

    let order_repo = OrderRepository::new(state.get_db());
    let order = order_repo.find_by_reference(1).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::WaitingBankTransfer);
    assert!(order.paid_at.is_none());

    // Cart destroyed, stock decremented in the same transaction
    assert!(CartRepository::new(state.get_db())
        .find(&user.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(sku_stock(&state, "pouch").await, 3);

    let emails = emails_of(&handles);
    assert!(emails
        .iter()
        .any(|(_, template)| template == "order_submitted_admin"));
    assert!(emails
        .iter()
        .any(|(to, template)| template == "bank_transfer_instructions" && to == "ada@example.com"));
    // Not paid yet: no invoice, no payment-received notice
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_confirm_bank_transfer_runs_on_paid_once() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 1).await;
    submit(&state, &user, &checkout_input(PaymentMethod::BankTransfer))
        .await
        .unwrap();

    let order = confirm_bank_transfer(&state, 1).await.unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.paid_at.is_some());
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 1);

    // A second confirmation is a state conflict, not a double payment
    assert!(matches!(
        confirm_bank_transfer(&state, 1).await,
        Err(CheckoutError::Conflict(_))
    ));
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Promotion usage
// =============================================================================

#[tokio::test]
async fn test_promotion_usage_increments_once_per_order() {
    let (state, _handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    seed_promotion(&state, "ten", "TEN", 10.0).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    let mut input = checkout_input(PaymentMethod::BankTransfer);
    input.promotion_code = Some("TEN".to_string());

    // A quote never consumes usage
    let quoted = quote(&state, &user, &input).await.unwrap();
    assert_eq!(quoted.discount_amount, 2.4);
    assert_eq!(promotion_used(&state, "ten").await, 0);

    let outcome = submit(&state, &user, &input).await.unwrap();
    // 24.00 − 2.40 + 6.90
    assert_eq!(
        outcome,
        CheckoutOutcome::BankTransfer {
            order_reference: 1,
            amount_due: 28.5
        }
    );
    assert_eq!(promotion_used(&state, "ten").await, 1);
}

#[tokio::test]
async fn test_unknown_promotion_rejected() {
    let (state, _handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 1).await;

    let mut input = checkout_input(PaymentMethod::BankTransfer);
    input.promotion_code = Some("NOPE".to_string());

    match submit(&state, &user, &input).await {
        Err(CheckoutError::Rejected(code)) => {
            assert_eq!(code, CheckoutErrorCode::PromotionUnknown)
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    // Nothing persisted
    assert!(OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// Gift-card-only path
// =============================================================================

#[tokio::test]
async fn test_gift_card_only_order_is_paid_immediately() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    seed_gift_card(&state, "a", 50.0, &user.id).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    let mut input = checkout_input(PaymentMethod::Card);
    input.gift_cards = vec!["gift_card:a".to_string()];

    let outcome = submit(&state, &user, &input).await.unwrap();
    assert_eq!(outcome, CheckoutOutcome::Paid { order_reference: 1 });

    let order = OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.billing.payment_method, PaymentMethod::GiftCard);
    assert!(order.paid_at.is_some());
    assert_eq!(order.totals.amount_due, 0.0);
    // 24.00 + 6.90 consumed from the card, in the submission transaction
    let card: Option<GiftCard> = state.get_db().select(("gift_card", "a")).await.unwrap();
    assert_eq!(card.unwrap().consumed_amount, 30.9);
    assert_eq!(sku_stock(&state, "pouch").await, 3);
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 1);
    assert!(emails_of(&handles)
        .iter()
        .any(|(_, template)| template == "payment_received"));
    assert!(handles
        .notifier
        .events
        .lock()
        .unwrap()
        .contains(&"order_paid".to_string()));
}

#[tokio::test]
async fn test_foreign_gift_card_rejected() {
    let (state, _handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    seed_gift_card(&state, "a", 50.0, "someone-else").await;
    fill_cart_in_stock(&state, &user.id, "pouch", 1).await;

    let mut input = checkout_input(PaymentMethod::Card);
    input.gift_cards = vec!["gift_card:a".to_string()];

    match submit(&state, &user, &input).await {
        Err(CheckoutError::Rejected(code)) => {
            assert_eq!(code, CheckoutErrorCode::GiftCardWrongOwner)
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

// =============================================================================
// Card path: draft, webhook finalization, idempotency
// =============================================================================

#[tokio::test]
async fn test_card_submission_creates_draft_and_session() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    let outcome = submit(&state, &user, &checkout_input(PaymentMethod::Card))
        .await
        .unwrap();
    match outcome {
        CheckoutOutcome::Card {
            order_reference,
            payment_url,
        } => {
            assert_eq!(order_reference, 1);
            assert_eq!(payment_url, "https://pay.example/cs_1");
        }
        other => panic!("expected card outcome, got {other:?}"),
    }

    let order_repo = OrderRepository::new(state.get_db());
    let draft = order_repo.find_by_reference(1).await.unwrap().unwrap();
    assert_eq!(draft.status, OrderStatus::Draft);
    assert_eq!(draft.billing.session_id.as_deref(), Some("cs_1"));

    // Drafts are never user-visible
    assert!(order_repo.find_by_user(&user.id).await.unwrap().is_empty());

    // Cart survives, linked to the draft; stock untouched until payment
    let cart = CartRepository::new(state.get_db())
        .find(&user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(cart.draft_order.is_some());
    assert_eq!(sku_stock(&state, "pouch").await, 5);
    assert_eq!(handles.billing.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_finalization_and_replay_guard() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    seed_promotion(&state, "ten", "TEN", 10.0).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    let mut input = checkout_input(PaymentMethod::Card);
    input.promotion_code = Some("TEN".to_string());
    submit(&state, &user, &input).await.unwrap();
    assert_eq!(promotion_used(&state, "ten").await, 0);

    let completed = CompletedSession {
        session_id: "cs_1".to_string(),
        order_reference: 1,
    };
    let order = finalize_card_payment(&state, &completed).await.unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.paid_at.is_some());

    // Webhook transaction: cart deleted, promotion consumed; stock follows
    assert!(CartRepository::new(state.get_db())
        .find(&user.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(promotion_used(&state, "ten").await, 1);
    assert_eq!(sku_stock(&state, "pouch").await, 3);
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 1);

    // Replaying the same event is a no-op conflict: no duplicate stock
    // decrement, no duplicate invoice
    assert!(matches!(
        finalize_card_payment(&state, &completed).await,
        Err(CheckoutError::Conflict(_))
    ));
    assert_eq!(sku_stock(&state, "pouch").await, 3);
    assert_eq!(promotion_used(&state, "ten").await, 1);
    assert_eq!(handles.invoices.generated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_billing_failure_leaves_nothing_behind() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;
    handles.billing.fail_create.store(true, Ordering::SeqCst);

    let result = submit(&state, &user, &checkout_input(PaymentMethod::Card)).await;
    assert!(matches!(result, Err(CheckoutError::Dependency(_))));

    // Draft rolled back, cart intact and unlinked, stock untouched
    assert!(OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .is_none());
    let cart = CartRepository::new(state.get_db())
        .find(&user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(cart.draft_order.is_none());
    assert_eq!(cart.items.len(), 1);
    assert_eq!(sku_stock(&state, "pouch").await, 5);
}

// =============================================================================
// Draft guard
// =============================================================================

#[tokio::test]
async fn test_guard_cancels_superseded_draft() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;
    submit(&state, &user, &checkout_input(PaymentMethod::Card))
        .await
        .unwrap();

    guard::cancel_superseded_draft(&state, &user.id).await.unwrap();

    // Session cancelled (it had not expired), draft deleted, link cleared
    assert_eq!(
        handles.billing.cancelled.lock().unwrap().as_slice(),
        &["cs_1".to_string()]
    );
    assert!(OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .is_none());
    let cart = CartRepository::new(state.get_db())
        .find(&user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(cart.draft_order.is_none());
}

#[tokio::test]
async fn test_guard_skips_cancel_for_expired_session() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;
    submit(&state, &user, &checkout_input(PaymentMethod::Card))
        .await
        .unwrap();
    handles.billing.expired.store(true, Ordering::SeqCst);

    guard::cancel_superseded_draft(&state, &user.id).await.unwrap();

    assert!(handles.billing.cancelled.lock().unwrap().is_empty());
    assert!(OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_resubmission_replaces_previous_draft() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 2).await;

    submit(&state, &user, &checkout_input(PaymentMethod::Card))
        .await
        .unwrap();
    submit(&state, &user, &checkout_input(PaymentMethod::Card))
        .await
        .unwrap();

    // First draft cancelled (session and record), a fresh session backs the
    // second attempt; at most one live payment attempt per cart
    assert_eq!(handles.billing.cancelled.lock().unwrap().len(), 1);
    assert_eq!(handles.billing.created.lock().unwrap().len(), 2);
    let order_repo = OrderRepository::new(state.get_db());
    let drafts = order_repo.list_all().await.unwrap();
    // list_all hides drafts; the only order row is the live draft
    assert!(drafts.is_empty());
    let draft = order_repo.find_by_reference(1).await.unwrap().unwrap();
    assert_eq!(draft.status, OrderStatus::Draft);
}

// =============================================================================
// Post-paid side effect tolerance
// =============================================================================

#[tokio::test]
async fn test_invoice_failure_never_blocks_payment() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    seed_sku(&state, "pouch", 12.0, 5).await;
    fill_cart_in_stock(&state, &user.id, "pouch", 1).await;
    submit(&state, &user, &checkout_input(PaymentMethod::BankTransfer))
        .await
        .unwrap();

    handles.invoices.fail.store(true, Ordering::SeqCst);
    let order = confirm_bank_transfer(&state, 1).await.unwrap();
    // Payment sticks, the order just has no invoice yet
    assert_eq!(order.status, OrderStatus::Paid);
    let stored = OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.invoice_url.is_none());

    // The document is regenerable once the renderer is back
    handles.invoices.fail.store(false, Ordering::SeqCst);
    let url = regenerate_invoice(&state, 1).await.unwrap();
    let stored = OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.invoice_url, Some(url));
}

// =============================================================================
// Purchased gift cards
// =============================================================================

#[tokio::test]
async fn test_purchased_gift_card_issued_on_payment() {
    let (state, handles) = test_state(ShopOffers::default()).await;
    let user = test_user();
    fill_cart_gift_card(&state, &user.id, 30.0).await;

    submit(&state, &user, &checkout_input(PaymentMethod::BankTransfer))
        .await
        .unwrap();
    // Not issued while waiting for the transfer
    let repo = GiftCardRepository::new(state.get_db());
    assert!(repo
        .claim_for_email("friend@example.com", "friend-user")
        .await
        .unwrap()
        .is_empty());

    confirm_bank_transfer(&state, 1).await.unwrap();

    let claimed = repo
        .claim_for_email("friend@example.com", "friend-user")
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].amount, 30.0);
    assert_eq!(claimed[0].issued_by_order, Some(1));
    assert!(emails_of(&handles)
        .iter()
        .any(|(to, template)| template == "gift_card_issued" && to == "friend@example.com"));
}

// =============================================================================
// Transaction atomicity (repository level)
// =============================================================================

fn manual_in_stock_order(reference: i64, sku_key: &str, quantity: i32) -> Order {
    Order {
        id: None,
        reference,
        status: OrderStatus::WaitingBankTransfer,
        workflow_step: shared::models::order::WorkflowStep::Production,
        customer: Customer {
            user: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
        },
        totals: OrderTotals::default(),
        items: vec![OrderItem::InStock {
            sku: format!("stock_sku:{sku_key}").parse().unwrap(),
            name: "Sku".to_string(),
            quantity,
            unit_price: 12.0,
            total: 12.0 * quantity as f64,
            original_total: 12.0 * quantity as f64,
            weight_grams: 100,
            tax: 0.0,
            image: None,
        }],
        shipping: ShippingLine {
            carrier: "COLISSIMO".to_string(),
            offer: "home".to_string(),
            country: "FR".to_string(),
            pickup_point: None,
            tax_included: 6.9,
            original_tax_included: 6.9,
            free: false,
            label_url: None,
        },
        billing: BillingInfo {
            address: address(),
            payment_method: PaymentMethod::BankTransfer,
            gift_cards: Default::default(),
            session_id: None,
        },
        promotion: None,
        extras: None,
        free_gift: false,
        invoice_url: None,
        created_at: Utc::now().to_rfc3339(),
        paid_at: None,
    }
}

#[tokio::test]
async fn test_oversell_aborts_whole_submission_transaction() {
    let (state, _handles) = test_state(ShopOffers::default()).await;
    seed_sku(&state, "rare", 12.0, 1).await;

    let order = manual_in_stock_order(1, "rare", 2);
    let effects = SubmitEffects {
        cart: None,
        promotion: None,
        gift_cards: vec![],
        stock: vec![("stock_sku:rare".parse().unwrap(), 2)],
    };

    let result = OrderRepository::new(state.get_db())
        .create_submitted(&order, &effects)
        .await;
    assert!(matches!(result, Err(RepoError::StockConflict)));

    // Rolled back together: no order row, stock untouched
    assert!(OrderRepository::new(state.get_db())
        .find_by_reference(1)
        .await
        .unwrap()
        .is_none());
    assert_eq!(sku_stock(&state, "rare").await, 1);
}
