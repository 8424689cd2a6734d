// handlers/public/health.rs - GET / and GET /health

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "collab-admin",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "users": "/api/users/lookup/:identifier (protected)",
                "tokens": "/api/users/:user_id/tokens, /api/tokens/:token_id, /api/users/tokens/revoke (protected)",
                "config": "/api/config/client, /api/config/service (protected, service updates require system admin)",
            }
        }
    }))
}

/// Reports `degraded` with 503 when the store cannot be reached or read
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let check = match state.service.store().ping().await {
        Ok(()) => state.service.settings().await.map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match check {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": { "status": "degraded", "timestamp": now, "store_error": e }
            })),
        ),
    }
}
