//! Checkout API Handlers

use axum::Json;
use axum::extract::State;
use shared::checkout::{CheckoutInput, CheckoutOutcome, CheckoutQuote};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::checkout::lifecycle;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

fn validated(input: &CheckoutInput) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// POST /api/checkout/quote - 报价预览 (不落库、不消耗任何计数)
pub async fn quote(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<CheckoutInput>,
) -> AppResult<Json<CheckoutQuote>> {
    validated(&input)?;
    let quote = lifecycle::quote(&state, &user, &input).await?;
    Ok(Json(quote))
}

/// POST /api/checkout - 提交订单
pub async fn submit(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<CheckoutInput>,
) -> AppResult<Json<CheckoutOutcome>> {
    validated(&input)?;
    let outcome = lifecycle::submit(&state, &user, &input).await?;
    Ok(Json(outcome))
}
