use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{AdministrativeClient, ClientError};
use crate::database::models::{AccessToken, ServiceSettings, ServiceSettingsPatch, User};
use crate::services::{AdminService, Caller, Page, ServiceError};

/// In-process client. Every call runs as the caller it was built with.
#[derive(Clone)]
pub struct LocalClient {
    service: Arc<AdminService>,
    caller: Caller,
}

impl LocalClient {
    /// Trusted local channel
    pub fn new(service: Arc<AdminService>) -> Self {
        Self::with_caller(service, Caller::Local)
    }

    pub fn with_caller(service: Arc<AdminService>, caller: Caller) -> Self {
        Self { service, caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

impl From<ServiceError> for ClientError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ClientError::NotFound(msg),
            ServiceError::PermissionDenied(msg) => ClientError::PermissionDenied(msg),
            ServiceError::FeatureDisabled(msg) => ClientError::FeatureDisabled(msg),
            ServiceError::Unauthorized(msg) => ClientError::Unauthorized(msg),
            ServiceError::InvalidInput(message) => ClientError::Server { status: 400, message },
            ServiceError::Conflict(message) => ClientError::Server { status: 409, message },
            ServiceError::Database(db) => ClientError::Internal(db.to_string()),
        }
    }
}

#[async_trait]
impl AdministrativeClient for LocalClient {
    async fn find_user(&self, identifier: &str) -> Result<User, ClientError> {
        Ok(self.service.find_user(identifier).await?)
    }

    async fn is_token_feature_enabled(&self) -> Result<bool, ClientError> {
        Ok(self.service.is_token_feature_enabled().await?)
    }

    async fn create_access_token(&self, user_id: Uuid, description: &str) -> Result<AccessToken, ClientError> {
        Ok(self
            .service
            .create_user_access_token(&self.caller, user_id, description)
            .await?)
    }

    async fn revoke_access_token(&self, token_id: &str) -> Result<(), ClientError> {
        Ok(self.service.revoke_access_token(&self.caller, token_id).await?)
    }

    async fn get_access_token(&self, token_id: &str) -> Result<AccessToken, ClientError> {
        Ok(self.service.get_access_token(&self.caller, token_id).await?)
    }

    async fn list_access_tokens(&self, user_id: Uuid, page: Page) -> Result<Vec<AccessToken>, ClientError> {
        Ok(self.service.list_access_tokens(&self.caller, user_id, page).await?)
    }

    async fn update_service_settings(&self, patch: &ServiceSettingsPatch) -> Result<ServiceSettings, ClientError> {
        Ok(self.service.update_settings(&self.caller, patch).await?)
    }
}
