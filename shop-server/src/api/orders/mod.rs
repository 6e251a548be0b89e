//! Orders API 模块

mod handler;

use axum::{Router, routing::get, routing::post, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_mine))
        .route("/all", get(handler::list_all))
        .route("/{reference}", get(handler::get_by_reference))
        .route(
            "/{reference}/confirm-transfer",
            post(handler::confirm_transfer),
        )
        .route("/{reference}/workflow-step", put(handler::set_workflow_step))
        .route("/{reference}/invoice", post(handler::regenerate_invoice))
}
