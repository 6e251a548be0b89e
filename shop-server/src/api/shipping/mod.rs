//! Shipping API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shipping", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/offers", get(handler::offers))
        .route("/pickup-points", get(handler::pickup_points))
}
