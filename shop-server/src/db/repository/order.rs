//! Order Repository
//!
//! Owns the multi-statement transactions behind the three payment paths:
//!
//! - bank-transfer / gift-card submissions: order creation, cart deletion,
//!   promotion usage, gift-card consumption and conditional stock decrements
//!   commit together or not at all (a zero-row stock decrement THROWs);
//! - card finalization (webhook): the status flip is guarded by
//!   `status = DRAFT` so replayed or duplicate events abort with a typed
//!   conflict instead of double-applying side effects.
//!
//! Stock decrements for the card path run as individual atomic conditional
//! updates after the finalization transaction; by then the payment has
//! already been captured, so a conflict is logged, not rolled back.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, StockSku};
use shared::models::order::WorkflowStep;

const TABLE: &str = "order";

/// Counter moves applied together with an order mutation
#[derive(Debug, Clone, Default)]
pub struct SubmitEffects {
    /// Cart record to delete
    pub cart: Option<RecordId>,
    /// Promotion code whose `used` counter increments
    pub promotion: Option<RecordId>,
    /// Gift card id → amount added to `consumed_amount`
    pub gift_cards: Vec<(RecordId, f64)>,
    /// Sku id → quantity to decrement (conditional on remaining stock)
    pub stock: Vec<(RecordId, i64)>,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Next order reference: current maximum plus one. Two concurrent
    /// submissions can read the same maximum; the unique index on
    /// `reference` turns the loser into an integrity error.
    pub async fn next_reference(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE reference FROM order ORDER BY reference DESC LIMIT 1")
            .await?;
        let max: Vec<i64> = result.take(0)?;
        Ok(max.first().copied().unwrap_or(0) + 1)
    }

    pub async fn find_by_reference(&self, reference: i64) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE reference = $reference LIMIT 1")
            .bind(("reference", reference))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// A user's visible orders (drafts are never user-visible)
    pub async fn find_by_user(&self, user: &str) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE customer.user = $user AND status != 'DRAFT' \
                 ORDER BY reference DESC",
            )
            .bind(("user", user.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Back-office listing (drafts excluded)
    pub async fn list_all(&self) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE status != 'DRAFT' ORDER BY reference DESC")
            .await?;
        Ok(result.take(0)?)
    }

    /// Persist a DRAFT order backing a card payment session
    pub async fn insert_draft(&self, order: &Order) -> RepoResult<Order> {
        let created: Option<Order> = self
            .base
            .db()
            .create(TABLE)
            .content(strip_id(order)?)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create draft order".to_string()))
    }

    /// Store the external session id on a draft
    pub async fn set_session(&self, order_id: &RecordId, session_id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $order SET billing.session_id = $session")
            .bind(("order", order_id.clone()))
            .bind(("session", session_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    /// Delete an abandoned draft
    pub async fn delete(&self, order_id: &RecordId) -> RepoResult<()> {
        let _: Option<Order> = self.base.db().delete(order_id.clone()).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, order_id: &RecordId) -> RepoResult<Option<Order>> {
        Ok(self.base.db().select(order_id.clone()).await?)
    }

    /// Bank-transfer and gift-card submissions: persist the order already in
    /// its final status and apply every submission effect in one
    /// transaction. A zero-row stock decrement aborts the whole thing.
    pub async fn create_submitted(
        &self,
        order: &Order,
        effects: &SubmitEffects,
    ) -> RepoResult<Order> {
        let mut statements = vec!["CREATE order CONTENT $order;".to_string()];
        push_effect_statements(&mut statements, effects, true);

        let query = format!(
            "BEGIN TRANSACTION;\n{}\nCOMMIT TRANSACTION;",
            statements.join("\n")
        );

        let mut request = self.base.db().query(query).bind(("order", strip_id(order)?));
        request = bind_effects(request, effects);
        request.await?.check()?;

        self.find_by_reference(order.reference)
            .await?
            .ok_or_else(|| RepoError::Database("Submitted order vanished".to_string()))
    }

    /// Card-path finalization: flip the draft to PAID and apply the
    /// submission effects (except stock, handled by the caller). The
    /// `status = 'DRAFT'` guard makes webhook replays abort with a conflict.
    pub async fn finalize_card(
        &self,
        reference: i64,
        effects: &SubmitEffects,
    ) -> RepoResult<Order> {
        let mut statements = vec![
            "LET $updated = UPDATE order \
             SET status = 'PAID', workflow_step = 'PRODUCTION', paid_at = $paid_at \
             WHERE reference = $reference AND status = 'DRAFT' RETURN AFTER;"
                .to_string(),
            format!(
                "IF array::len($updated) == 0 {{ THROW \"{}\" }};",
                super::STATE_CONFLICT_MARKER
            ),
        ];
        push_effect_statements(&mut statements, effects, false);

        let query = format!(
            "BEGIN TRANSACTION;\n{}\nCOMMIT TRANSACTION;",
            statements.join("\n")
        );

        let mut request = self
            .base
            .db()
            .query(query)
            .bind(("reference", reference))
            .bind(("paid_at", Utc::now().to_rfc3339()));
        request = bind_effects(request, effects);
        request.await?.check()?;

        self.find_by_reference(reference)
            .await?
            .ok_or_else(|| RepoError::Database("Finalized order vanished".to_string()))
    }

    /// Single atomic conditional decrement; false means oversell
    pub async fn decrement_stock(&self, sku: &RecordId, quantity: i64) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $sku SET stock -= $qty WHERE stock >= $qty RETURN AFTER")
            .bind(("sku", sku.clone()))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<StockSku> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Admin confirmation of a received bank transfer
    pub async fn confirm_bank_transfer(&self, reference: i64) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE order SET status = 'PAID', paid_at = $paid_at \
                 WHERE reference = $reference AND status = 'WAITING_BANK_TRANSFER' RETURN AFTER",
            )
            .bind(("reference", reference))
            .bind(("paid_at", Utc::now().to_rfc3339()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders.into_iter().next().ok_or_else(|| {
            RepoError::Conflict(format!(
                "Order {reference} is not waiting for a bank transfer"
            ))
        })
    }

    /// Advance fulfillment; only PAID orders move
    pub async fn set_workflow_step(
        &self,
        reference: i64,
        step: WorkflowStep,
    ) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE order SET workflow_step = $step \
                 WHERE reference = $reference AND status = 'PAID' RETURN AFTER",
            )
            .bind(("reference", reference))
            .bind(("step", step))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Conflict(format!("Order {reference} is not paid")))
    }

    pub async fn set_label_url(&self, reference: i64, url: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE order SET shipping.label_url = $url WHERE reference = $reference")
            .bind(("reference", reference))
            .bind(("url", url.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn set_invoice_url(&self, reference: i64, url: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE order SET invoice_url = $url WHERE reference = $reference")
            .bind(("reference", reference))
            .bind(("url", url.to_string()))
            .await?
            .check()?;
        Ok(())
    }
}

/// Serialize an order without its `id` field (assigned by the database)
fn strip_id(order: &Order) -> RepoResult<serde_json::Value> {
    let mut value = serde_json::to_value(order)
        .map_err(|e| RepoError::Validation(format!("Unserializable order: {e}")))?;
    if let Some(object) = value.as_object_mut() {
        object.remove("id");
    }
    Ok(value)
}

/// Append effect statements. `with_stock` adds THROWing conditional stock
/// decrements (bank-transfer/gift-card paths); the card path skips them.
fn push_effect_statements(statements: &mut Vec<String>, effects: &SubmitEffects, with_stock: bool) {
    if effects.cart.is_some() {
        statements.push("DELETE $cart;".to_string());
    }
    if effects.promotion.is_some() {
        statements.push("UPDATE $promotion SET used += 1;".to_string());
    }
    for i in 0..effects.gift_cards.len() {
        statements.push(format!(
            "UPDATE $card_{i} SET consumed_amount += $card_amount_{i};"
        ));
    }
    if with_stock {
        for i in 0..effects.stock.len() {
            statements.push(format!(
                "LET $stock_{i} = UPDATE $sku_{i} SET stock -= $sku_qty_{i} \
                 WHERE stock >= $sku_qty_{i} RETURN AFTER;"
            ));
            statements.push(format!(
                "IF array::len($stock_{i}) == 0 {{ THROW \"{}\" }};",
                super::STOCK_CONFLICT_MARKER
            ));
        }
    }
}

type Query<'a> = surrealdb::method::Query<'a, Db>;

fn bind_effects<'a>(mut request: Query<'a>, effects: &SubmitEffects) -> Query<'a> {
    if let Some(cart) = &effects.cart {
        request = request.bind(("cart", cart.clone()));
    }
    if let Some(promotion) = &effects.promotion {
        request = request.bind(("promotion", promotion.clone()));
    }
    for (i, (card, amount)) in effects.gift_cards.iter().enumerate() {
        request = request.bind((format!("card_{i}"), card.clone()));
        request = request.bind((format!("card_amount_{i}"), *amount));
    }
    for (i, (sku, quantity)) in effects.stock.iter().enumerate() {
        request = request.bind((format!("sku_{i}"), sku.clone()));
        request = request.bind((format!("sku_qty_{i}"), *quantity));
    }
    request
}
