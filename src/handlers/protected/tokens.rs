// handlers/protected/tokens.rs - personal access token endpoints
//
// POST /api/users/:user_id/tokens       create (secret returned once)
// GET  /api/users/:user_id/tokens       list, paginated
// GET  /api/tokens/:token_id            read one
// POST /api/users/tokens/revoke         revoke by id

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::AccessToken;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Caller, Page};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeTokenRequest {
    pub token_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<CreateTokenRequest>,
) -> ApiResult<AccessToken> {
    let token = state
        .service
        .create_user_access_token(&caller, user_id, &body.description)
        .await?;
    Ok(ApiResponse::created(token))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<AccessToken>> {
    let tokens = state.service.list_access_tokens(&caller, user_id, page).await?;
    Ok(ApiResponse::success(tokens))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(token_id): Path<String>,
) -> ApiResult<AccessToken> {
    let token = state.service.get_access_token(&caller, &token_id).await?;
    Ok(ApiResponse::success(token))
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<RevokeTokenRequest>,
) -> ApiResult<StatusOk> {
    state.service.revoke_access_token(&caller, &body.token_id).await?;
    Ok(ApiResponse::success(StatusOk {
        status: "ok".to_string(),
    }))
}
