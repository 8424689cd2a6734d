use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AccessToken, ServiceSettings, User};

/// Authoritative persistence for users, access tokens and service settings.
///
/// Implementations serialize concurrent access themselves; callers perform no
/// extra locking.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip proving the backend is reachable
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Active users only
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Constraint` when the email or username is taken
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError>;

    /// Fails with `Constraint` when the owning user does not exist
    async fn insert_access_token(&self, token: &AccessToken, token_hash: &str) -> Result<(), DatabaseError>;
    async fn get_access_token(&self, id: &str) -> Result<Option<AccessToken>, DatabaseError>;
    async fn list_access_tokens_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AccessToken>, DatabaseError>;

    /// Returns false when no token with `id` existed
    async fn delete_access_token(&self, id: &str) -> Result<bool, DatabaseError>;

    async fn load_settings(&self) -> Result<Option<ServiceSettings>, DatabaseError>;
    async fn save_settings(&self, settings: &ServiceSettings) -> Result<(), DatabaseError>;
}
