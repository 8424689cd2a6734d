use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AccessToken, ServiceSettings, User};
use crate::database::store::Store;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    // token id -> (sanitized token, secret hash)
    tokens: HashMap<String, (AccessToken, String)>,
    settings: Option<ServiceSettings>,
}

/// In-process store used by tests and embedded deployments
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).filter(|u| u.is_active()).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.is_active() && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.is_active() && u.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let taken = inner.users.values().any(|u| {
            u.id == user.id || u.email.eq_ignore_ascii_case(&user.email) || u.username == user.username
        });
        if taken {
            return Err(DatabaseError::Constraint(format!(
                "user with email '{}' or username '{}' already exists",
                user.email, user.username
            )));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_access_token(&self, token: &AccessToken, token_hash: &str) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&token.user_id) {
            return Err(DatabaseError::Constraint(format!(
                "access token owner {} does not exist",
                token.user_id
            )));
        }
        if inner.tokens.contains_key(&token.id) {
            return Err(DatabaseError::Constraint(format!("access token {} already exists", token.id)));
        }
        inner
            .tokens
            .insert(token.id.clone(), (token.sanitized(), token_hash.to_string()));
        Ok(())
    }

    async fn get_access_token(&self, id: &str) -> Result<Option<AccessToken>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.tokens.get(id).map(|(token, _)| token.clone()))
    }

    async fn list_access_tokens_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AccessToken>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut tokens: Vec<AccessToken> = inner
            .tokens
            .values()
            .filter(|(token, _)| token.user_id == user_id)
            .map(|(token, _)| token.clone())
            .collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(tokens
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete_access_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(inner.tokens.remove(id).is_some())
    }

    async fn load_settings(&self) -> Result<Option<ServiceSettings>, DatabaseError> {
        Ok(self.inner.read().await.settings)
    }

    async fn save_settings(&self, settings: &ServiceSettings) -> Result<(), DatabaseError> {
        self.inner.write().await.settings = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;

    #[tokio::test]
    async fn rejects_tokens_for_unknown_owners() {
        let store = MemoryStore::new();
        let token = AccessToken::generate(Uuid::new_v4(), "orphan");
        let err = store
            .insert_access_token(&token, "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
        assert!(store.get_access_token(&token.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stores_tokens_without_their_secret() {
        let store = MemoryStore::new();
        let user = User::new("owner@example.com", "owner", vec![Role::SystemUser]);
        store.insert_user(&user).await.unwrap();

        let token = AccessToken::generate(user.id, "laptop");
        store
            .insert_access_token(&token, &token.token_hash().unwrap())
            .await
            .unwrap();

        let stored = store.get_access_token(&token.id).await.unwrap().unwrap();
        assert_eq!(stored, token.sanitized());

        assert!(store.delete_access_token(&token.id).await.unwrap());
        assert!(!store.delete_access_token(&token.id).await.unwrap());
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_inactive_users() {
        let store = MemoryStore::new();
        let mut gone = User::new("gone@example.com", "gone", vec![Role::SystemUser]);
        gone.deleted_at = Some(chrono::Utc::now());
        store.insert_user(&gone).await.unwrap();
        let here = User::new("Here@Example.com", "here", vec![Role::SystemUser]);
        store.insert_user(&here).await.unwrap();

        assert!(store.get_user_by_email("gone@example.com").await.unwrap().is_none());
        assert_eq!(
            store.get_user_by_email("here@example.com").await.unwrap().map(|u| u.id),
            Some(here.id)
        );
        assert!(store.insert_user(&User::new("here@example.com", "other", vec![])).await.is_err());
    }
}
