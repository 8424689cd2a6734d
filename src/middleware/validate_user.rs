use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::error::ApiError;

/// Middleware that resolves the session user to a privilege tier.
///
/// Runs after `jwt_auth_middleware`. The user must still exist and be active;
/// the resulting `Caller` is what handlers pass to the service.
pub async fn validate_user_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let caller = state.service.resolve_session(auth_user.user_id).await.map_err(|e| {
        tracing::warn!(
            "User validation failed for '{}' ({}): {}",
            auth_user.username,
            auth_user.user_id,
            e
        );
        ApiError::from(e)
    })?;

    tracing::debug!("Session {} resolved to {}", auth_user.username, caller.describe());

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
