// handlers/protected/users.rs - GET /api/users/lookup/:identifier

use std::sync::Arc;

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};

/// Resolve an email address or username to the active user record.
/// Any authenticated session may look users up.
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<User> {
    let user = state.service.find_user(&identifier).await?;
    Ok(ApiResponse::success(user))
}
