//! Shipping API Handlers
//!
//! Thin passthroughs over the quote collaborator so the storefront can show
//! carrier choices for the current cart weight.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::models::shipping::{PickupPoint, ShippingOffer};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{CartRepository, CatalogRepository};
use crate::money::VatRate;
use crate::pricing;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct OffersQuery {
    pub country: String,
}

/// GET /api/shipping/offers?country= - 当前购物车重量下的运费报价
pub async fn offers(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OffersQuery>,
) -> AppResult<Json<Vec<ShippingOffer>>> {
    let cart = CartRepository::new(state.get_db())
        .find_or_new(&user.id)
        .await?;
    let catalog = CatalogRepository::new(state.get_db())
        .snapshot(&cart.items)
        .await?;
    let priced = pricing::price_cart(&cart.items, &catalog, VatRate::new(state.config.vat_rate));

    let offers = state
        .services
        .shipping
        .get_offers(&query.country, priced.total_weight_grams)
        .await?;
    Ok(Json(offers))
}

#[derive(Debug, Deserialize)]
pub struct PickupQuery {
    pub carrier: String,
    pub country: String,
    pub zip_code: String,
}

/// GET /api/shipping/pickup-points - 取货点列表
pub async fn pickup_points(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<PickupQuery>,
) -> AppResult<Json<Vec<PickupPoint>>> {
    let points = state
        .services
        .shipping
        .list_pickup_points(&query.carrier, &query.country, &query.zip_code)
        .await?;
    Ok(Json(points))
}
