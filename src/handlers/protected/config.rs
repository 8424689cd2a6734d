// handlers/protected/config.rs - service settings

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{ServiceSettings, ServiceSettingsPatch};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Caller;

/// Settings any session may read
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub enable_user_access_tokens: bool,
}

/// GET /api/config/client
pub async fn client(State(state): State<Arc<AppState>>) -> ApiResult<ClientConfig> {
    let enabled = state.service.is_token_feature_enabled().await?;
    Ok(ApiResponse::success(ClientConfig {
        enable_user_access_tokens: enabled,
    }))
}

/// PUT /api/config/service - system administrators only
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(patch): Json<ServiceSettingsPatch>,
) -> ApiResult<ServiceSettings> {
    let settings = state.service.update_settings(&caller, &patch).await?;
    Ok(ApiResponse::success(settings))
}
