//! Health check handler

use axum::Json;
use axum::extract::State;

use crate::core::ServerState;

/// GET /api/health - 服务健康状态
pub async fn health(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "environment": state.config.environment,
    }))
}
