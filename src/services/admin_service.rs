use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AccessToken, ServiceSettings, ServiceSettingsPatch, User};
use crate::database::store::Store;
use crate::services::caller::Caller;

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have the appropriate permissions.";
pub const TOKENS_DISABLED_MESSAGE: &str =
    "User access tokens are disabled on this server. Please contact your system administrator for details.";
pub const TOKEN_NOT_FOUND_MESSAGE: &str = "Unable to get the user access token: not found.";
pub const USER_NOT_FOUND_MESSAGE: &str = "Unable to find the user: not found.";

const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const DEFAULT_PER_PAGE: u32 = 200;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    FeatureDisabled(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    fn permission_denied() -> Self {
        ServiceError::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_string())
    }
}

/// One page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, DEFAULT_PER_PAGE) as i64
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.limit()
    }
}

/// Authoritative user/token operations with the permission policy and the
/// feature gate. Both the local client and the HTTP API go through here.
pub struct AdminService {
    store: Arc<dyn Store>,
    defaults: ServiceSettings,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, defaults: ServiceSettings) -> Self {
        Self { store, defaults }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Persisted settings, falling back to the configured defaults
    pub async fn settings(&self) -> Result<ServiceSettings, ServiceError> {
        Ok(self.store.load_settings().await?.unwrap_or(self.defaults))
    }

    pub async fn update_settings(
        &self,
        caller: &Caller,
        patch: &ServiceSettingsPatch,
    ) -> Result<ServiceSettings, ServiceError> {
        if !caller.is_privileged() {
            warn!("Settings update denied for {}", caller.describe());
            return Err(ServiceError::permission_denied());
        }

        let updated = self.settings().await?.apply(patch);
        self.store.save_settings(&updated).await?;
        info!(
            "Service settings updated by {}: enable_user_access_tokens={}",
            caller.describe(),
            updated.enable_user_access_tokens
        );
        Ok(updated)
    }

    pub async fn is_token_feature_enabled(&self) -> Result<bool, ServiceError> {
        Ok(self.settings().await?.enable_user_access_tokens)
    }

    /// Map a session's user id to its privilege tier. Unknown or deactivated
    /// users hold no valid session.
    pub async fn resolve_session(&self, user_id: Uuid) -> Result<Caller, ServiceError> {
        match self.store.get_user(user_id).await? {
            Some(user) => Ok(Caller::for_user(&user)),
            None => Err(ServiceError::Unauthorized(format!(
                "Session user {} is not active",
                user_id
            ))),
        }
    }

    /// Look a user up by email, then by username
    pub async fn find_user(&self, identifier: &str) -> Result<User, ServiceError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ServiceError::InvalidInput("user identifier must not be empty".to_string()));
        }

        if let Some(user) = self.store.get_user_by_email(identifier).await? {
            return Ok(user);
        }
        if let Some(user) = self.store.get_user_by_username(identifier).await? {
            return Ok(user);
        }

        debug!("No user matches '{}'", identifier);
        Err(ServiceError::NotFound(USER_NOT_FOUND_MESSAGE.to_string()))
    }

    pub async fn create_user(&self, caller: &Caller, user: User) -> Result<User, ServiceError> {
        if !caller.is_privileged() {
            return Err(ServiceError::permission_denied());
        }

        match self.store.insert_user(&user).await {
            Ok(()) => {
                info!("User {} ({}) created by {}", user.username, user.id, caller.describe());
                Ok(user)
            }
            Err(DatabaseError::Constraint(msg)) => Err(ServiceError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// Issue a new token for `user_id`.
    ///
    /// Checks run gate, permission, owner existence, in that order, so any
    /// failure leaves the token set untouched. The returned token is the only
    /// place the secret is ever exposed.
    pub async fn create_user_access_token(
        &self,
        caller: &Caller,
        user_id: Uuid,
        description: &str,
    ) -> Result<AccessToken, ServiceError> {
        if !self.is_token_feature_enabled().await? {
            return Err(ServiceError::FeatureDisabled(TOKENS_DISABLED_MESSAGE.to_string()));
        }

        if !caller.can_manage_tokens_of(user_id) {
            warn!("Token creation for {} denied for {}", user_id, caller.describe());
            return Err(ServiceError::permission_denied());
        }

        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ServiceError::InvalidInput(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        if self.store.get_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound(USER_NOT_FOUND_MESSAGE.to_string()));
        }

        let token = AccessToken::generate(user_id, description);
        let hash = token
            .token_hash()
            .ok_or_else(|| ServiceError::InvalidInput("generated token has no secret".to_string()))?;

        match self.store.insert_access_token(&token, &hash).await {
            Ok(()) => {}
            // Owner removed between the existence check and the insert
            Err(DatabaseError::Constraint(_)) => {
                return Err(ServiceError::NotFound(USER_NOT_FOUND_MESSAGE.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!("Access token {} created for user {} by {}", token.id, user_id, caller.describe());
        Ok(token)
    }

    pub async fn get_access_token(&self, caller: &Caller, token_id: &str) -> Result<AccessToken, ServiceError> {
        let token = self
            .store
            .get_access_token(token_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TOKEN_NOT_FOUND_MESSAGE.to_string()))?;

        if !caller.can_manage_tokens_of(token.user_id) {
            return Err(ServiceError::permission_denied());
        }
        Ok(token.sanitized())
    }

    pub async fn list_access_tokens(
        &self,
        caller: &Caller,
        user_id: Uuid,
        page: Page,
    ) -> Result<Vec<AccessToken>, ServiceError> {
        if !caller.can_manage_tokens_of(user_id) {
            return Err(ServiceError::permission_denied());
        }

        let tokens = self
            .store
            .list_access_tokens_for_user(user_id, page.offset(), page.limit())
            .await?;
        Ok(tokens.iter().map(AccessToken::sanitized).collect())
    }

    /// Remove a token. Existence is checked before authority so a missing
    /// token and a denied caller stay distinguishable.
    pub async fn revoke_access_token(&self, caller: &Caller, token_id: &str) -> Result<(), ServiceError> {
        let token = self
            .store
            .get_access_token(token_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TOKEN_NOT_FOUND_MESSAGE.to_string()))?;

        if !caller.can_manage_tokens_of(token.user_id) {
            warn!("Revocation of token {} denied for {}", token_id, caller.describe());
            return Err(ServiceError::permission_denied());
        }

        if !self.store.delete_access_token(token_id).await? {
            return Err(ServiceError::NotFound(TOKEN_NOT_FOUND_MESSAGE.to_string()));
        }

        info!("Access token {} revoked by {}", token_id, caller.describe());
        Ok(())
    }
}
