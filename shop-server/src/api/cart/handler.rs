//! Cart API Handlers
//!
//! The stored cart is never returned as-is: every read runs the pricing
//! engine against the live catalog. Every mutation runs the draft guard
//! first so a stale payment session cannot survive a cart change.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::models::cart::{CartItemInput, PricedCart};

use crate::auth::CurrentUser;
use crate::checkout::guard;
use crate::core::ServerState;
use crate::db::models::CartItem;
use crate::db::repository::{CartRepository, CatalogRepository};
use crate::money::VatRate;
use crate::pricing;
use crate::utils::{validation, AppError, AppResult};

/// Price a user's stored cart against the live catalog
async fn priced_cart_of(state: &ServerState, user: &str) -> AppResult<PricedCart> {
    let cart = CartRepository::new(state.get_db()).find_or_new(user).await?;
    let catalog = CatalogRepository::new(state.get_db())
        .snapshot(&cart.items)
        .await?;
    Ok(pricing::price_cart(
        &cart.items,
        &catalog,
        VatRate::new(state.config.vat_rate),
    ))
}

/// GET /api/cart - 当前购物车 (读取即计价)
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<PricedCart>> {
    Ok(Json(priced_cart_of(&state, &user.id).await?))
}

/// POST /api/cart/items - 加入商品
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemInput>,
) -> AppResult<Json<PricedCart>> {
    validation::validate_cart_item(&payload)?;
    guard::cancel_superseded_draft(&state, &user.id).await?;

    let item = CartItem::from_input(payload).map_err(AppError::Validation)?;
    check_availability(&state, &item).await?;

    CartRepository::new(state.get_db())
        .add_item(&user.id, item)
        .await?;
    Ok(Json(priced_cart_of(&state, &user.id).await?))
}

/// Best-effort availability check at add time, not a reservation
async fn check_availability(state: &ServerState, item: &CartItem) -> AppResult<()> {
    let catalog = CatalogRepository::new(state.get_db());
    match item {
        CartItem::InStock { sku, quantity } => {
            let found = catalog
                .find_sku(sku)
                .await?
                .filter(|s| s.enabled)
                .ok_or_else(|| AppError::NotFound(format!("Sku {sku} not available")))?;
            if found.stock < *quantity as i64 {
                return Err(AppError::BusinessRule(
                    shared::error::CheckoutErrorCode::StockConflict.to_string(),
                ));
            }
        }
        CartItem::Customized { article, .. } => {
            catalog
                .find_article(article)
                .await?
                .filter(|a| a.enabled)
                .ok_or_else(|| AppError::NotFound(format!("Article {article} not available")))?;
        }
        CartItem::GiftCard { .. } => {}
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: i32,
}

/// PUT /api/cart/items/{index} - 修改数量
pub async fn update_quantity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(index): Path<usize>,
    Json(body): Json<QuantityBody>,
) -> AppResult<Json<PricedCart>> {
    if body.quantity <= 0 || body.quantity > validation::MAX_QUANTITY {
        return Err(AppError::Validation(format!(
            "quantity out of range: {}",
            body.quantity
        )));
    }
    guard::cancel_superseded_draft(&state, &user.id).await?;

    CartRepository::new(state.get_db())
        .update_quantity(&user.id, index, body.quantity)
        .await?;
    Ok(Json(priced_cart_of(&state, &user.id).await?))
}

/// DELETE /api/cart/items/{index} - 移除一行
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(index): Path<usize>,
) -> AppResult<Json<PricedCart>> {
    guard::cancel_superseded_draft(&state, &user.id).await?;

    CartRepository::new(state.get_db())
        .remove_item(&user.id, index)
        .await?;
    Ok(Json(priced_cart_of(&state, &user.id).await?))
}

/// DELETE /api/cart - 清空购物车
pub async fn empty_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<PricedCart>> {
    guard::cancel_superseded_draft(&state, &user.id).await?;

    CartRepository::new(state.get_db()).delete(&user.id).await?;
    Ok(Json(PricedCart::default()))
}
