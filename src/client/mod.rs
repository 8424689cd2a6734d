// client/mod.rs - how the token commands reach authoritative state
//
// LocalClient calls AdminService in-process; RemoteClient talks to the HTTP
// API with a bearer session. The command handlers only see the trait.

pub mod local;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{AccessToken, ServiceSettings, ServiceSettingsPatch, User};
use crate::services::Page;

pub use local::LocalClient;
pub use remote::RemoteClient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    FeatureDisabled(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Internal(String),
}

#[async_trait]
pub trait AdministrativeClient: Send + Sync {
    /// Resolve an email address or username to an active user
    async fn find_user(&self, identifier: &str) -> Result<User, ClientError>;

    async fn is_token_feature_enabled(&self) -> Result<bool, ClientError>;

    /// Create a token for `user_id`; the result is the only copy of the secret
    async fn create_access_token(&self, user_id: Uuid, description: &str) -> Result<AccessToken, ClientError>;

    async fn revoke_access_token(&self, token_id: &str) -> Result<(), ClientError>;

    async fn get_access_token(&self, token_id: &str) -> Result<AccessToken, ClientError>;

    async fn list_access_tokens(&self, user_id: Uuid, page: Page) -> Result<Vec<AccessToken>, ClientError>;

    async fn update_service_settings(&self, patch: &ServiceSettingsPatch) -> Result<ServiceSettings, ClientError>;
}
