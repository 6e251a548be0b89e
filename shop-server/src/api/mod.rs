//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`cart`] - 购物车读写 (读取即计价)
//! - [`checkout`] - 报价与下单
//! - [`orders`] - 订单查询与后台操作
//! - [`gift_cards`] - 礼品卡查询与认领
//! - [`shipping`] - 运费报价与取货点
//! - [`webhook`] - 支付回调

pub mod cart;
pub mod checkout;
pub mod gift_cards;
pub mod health;
pub mod orders;
pub mod shipping;
pub mod webhook;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(orders::router())
        .merge(gift_cards::router())
        .merge(shipping::router())
        .merge(webhook::router())
}

/// Build a fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Bound concurrent in-flight requests
        .layer(ConcurrencyLimitLayer::new(1024))
        .with_state(state)
}
