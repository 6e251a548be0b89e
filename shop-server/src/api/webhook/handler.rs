//! Billing webhook handler
//!
//! POST /api/billing/webhook - handles payment provider events (raw body
//! for signature verification). Replays are rejected by the DRAFT-status
//! guard inside finalization, not by a dedup table, and acknowledged with
//! 200 so the provider stops retrying.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::checkout::lifecycle;
use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::services::billing;

pub async fn handle_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // 1. Get signature header
    let sig_header = match headers.get("billing-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            tracing::warn!("Missing billing-signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    // 2. Verify signature against the raw body
    if let Err(e) = billing::verify_webhook_signature(
        &body,
        sig_header,
        &state.config.billing_webhook_secret,
    ) {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    // 3. Parse JSON event
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type = event_type, "Received billing webhook");

    // 4. Only completed sessions matter here; everything else is ack'd
    let Some(completed) = billing::extract_completed_session(&event) else {
        tracing::debug!(event_type = event_type, "Unhandled webhook event type");
        return StatusCode::OK;
    };

    // 5. Finalize the order behind the session
    match lifecycle::finalize_card_payment(&state, &completed).await {
        Ok(order) => {
            tracing::info!(
                order = order.reference,
                session = %completed.session_id,
                "Order paid via card session"
            );
            StatusCode::OK
        }
        // Replayed or duplicate event: no mutation happened, tell the
        // provider to stop retrying
        Err(CheckoutError::Conflict(msg)) => {
            tracing::info!(
                reference = completed.order_reference,
                reason = %msg,
                "Webhook ignored (order not in DRAFT)"
            );
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(reference = completed.order_reference, error = %e,
                "Webhook finalization failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
