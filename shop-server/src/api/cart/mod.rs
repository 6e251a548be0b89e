//! Cart API 模块

mod handler;

use axum::{Router, routing::get, routing::post, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::empty_cart))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{index}",
            put(handler::update_quantity).delete(handler::remove_item),
        )
}
