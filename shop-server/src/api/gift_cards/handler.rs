//! Gift Cards API Handlers

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::GiftCard;
use crate::db::repository::GiftCardRepository;
use crate::utils::{AppError, AppResult};

/// A card as shown to its owner
#[derive(Debug, Serialize)]
pub struct GiftCardView {
    pub id: String,
    pub code: String,
    pub amount: f64,
    pub remaining: f64,
    pub expired: bool,
    pub issued_by_order: Option<i64>,
    pub created_at: String,
}

fn view_of(card: &GiftCard) -> GiftCardView {
    GiftCardView {
        id: card.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
        code: card.code.clone(),
        amount: card.amount,
        remaining: card.remaining(),
        expired: card.is_expired(Utc::now()),
        issued_by_order: card.issued_by_order,
        created_at: card.created_at.clone(),
    }
}

/// GET /api/gift-cards - 当前用户的礼品卡
///
/// Unclaimed cards addressed to the login email are attached first, so a
/// recipient sees their card right after logging in.
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<GiftCardView>>> {
    let repo = GiftCardRepository::new(state.get_db());
    repo.claim_for_email(&user.email, &user.id).await?;
    let cards = repo.find_by_owner(&user.id).await?;
    Ok(Json(cards.iter().map(view_of).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ClaimBody {
    pub code: String,
}

/// POST /api/gift-cards/claim - 凭码认领礼品卡
pub async fn claim(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(body): Json<ClaimBody>,
) -> AppResult<Json<GiftCardView>> {
    let repo = GiftCardRepository::new(state.get_db());
    let card = repo
        .find_by_code(&body.code)
        .await?
        .ok_or_else(|| AppError::NotFound("No gift card with this code".to_string()))?;
    let id = card
        .id
        .clone()
        .ok_or_else(|| AppError::Internal("gift card without id".to_string()))?;

    let claimed = repo
        .claim(&id, &user.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Gift card already claimed".to_string()))?;

    Ok(Json(view_of(&claimed)))
}
