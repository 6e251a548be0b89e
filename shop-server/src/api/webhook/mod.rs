//! Billing Webhook API 模块

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/billing/webhook", post(handler::handle_webhook))
}
