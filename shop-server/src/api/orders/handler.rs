//! Orders API Handlers
//!
//! Customers see their own (non-draft) orders; the back office confirms
//! bank transfers, advances fulfillment and regenerates invoices.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::models::order::{OrderSummary, WorkflowStep};

use crate::auth::{require_admin, CurrentUser};
use crate::checkout::lifecycle;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::services::notify::send_email_logged;
use crate::utils::{AppError, AppResult};

fn summary_of(order: &Order) -> OrderSummary {
    OrderSummary {
        reference: order.reference,
        status: order.status,
        workflow_step: order.workflow_step,
        total_tax_included: order.totals.total_tax_included,
        payment_method: order.billing.payment_method,
        created_at: order.created_at.clone(),
        paid_at: order.paid_at.clone(),
    }
}

/// GET /api/orders - 当前用户的订单
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.get_db())
        .find_by_user(&user.id)
        .await?;
    Ok(Json(orders.iter().map(summary_of).collect()))
}

/// GET /api/orders/all - 全部订单 (后台)
pub async fn list_all(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderSummary>>> {
    require_admin(&user)?;
    let orders = OrderRepository::new(state.get_db()).list_all().await?;
    Ok(Json(orders.iter().map(summary_of).collect()))
}

/// GET /api/orders/{reference} - 订单详情 (本人或后台)
pub async fn get_by_reference(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(reference): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = OrderRepository::new(state.get_db())
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {reference} not found")))?;

    if order.customer.user != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("not your order".to_string()));
    }

    Ok(Json(order))
}

/// POST /api/orders/{reference}/confirm-transfer - 银行转账到账确认 (后台)
pub async fn confirm_transfer(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(reference): Path<i64>,
) -> AppResult<Json<Order>> {
    require_admin(&user)?;
    let order = lifecycle::confirm_bank_transfer(&state, reference).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct WorkflowStepBody {
    pub step: WorkflowStep,
}

/// PUT /api/orders/{reference}/workflow-step - 推进制作/发货状态 (后台)
///
/// Moving to SHIPPING buys the carrier label first; a failed purchase
/// leaves the order in PRODUCTION so the admin can retry.
pub async fn set_workflow_step(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(reference): Path<i64>,
    Json(body): Json<WorkflowStepBody>,
) -> AppResult<Json<Order>> {
    require_admin(&user)?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {reference} not found")))?;

    // Fulfillment only moves forward, one step at a time
    if order.workflow_step.next() != Some(body.step) {
        return Err(AppError::Conflict(format!(
            "Cannot move order {reference} from {:?} to {:?}",
            order.workflow_step, body.step
        )));
    }

    if body.step == WorkflowStep::Shipping {
        let label_url = state
            .services
            .shipping
            .buy_shipping_label(
                reference,
                &order.shipping.carrier,
                &order.shipping.offer,
                order.totals.total_weight_grams,
                &order.billing.address,
                order.shipping.pickup_point.as_deref(),
            )
            .await?;
        repo.set_label_url(reference, &label_url).await?;

        send_email_logged(
            state.services.notifier.as_ref(),
            &order.customer.email,
            "order_shipped",
            &serde_json::json!({ "reference": reference }),
        )
        .await;
    }

    let updated = repo.set_workflow_step(reference, body.step).await?;
    Ok(Json(updated))
}

/// POST /api/orders/{reference}/invoice - 重新生成发票 (后台)
pub async fn regenerate_invoice(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(reference): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&user)?;
    let url = lifecycle::regenerate_invoice(&state, reference).await?;
    Ok(Json(serde_json::json!({ "invoice_url": url })))
}
