use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// A personal access token owned by a user.
///
/// `token` carries the secret and is only populated on the value returned by
/// creation. Stored records keep a SHA-256 hash of it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AccessToken {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(default)]
    pub token: Option<String>,
    pub user_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a fresh token for `user_id` with a newly generated id and secret.
    pub fn generate(user_id: Uuid, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            token: Some(Uuid::new_v4().simple().to_string()),
            user_id,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Hex SHA-256 of the secret, or `None` once the secret has been dropped
    pub fn token_hash(&self) -> Option<String> {
        self.token.as_deref().map(hash_token)
    }

    /// Copy of this token without its secret
    pub fn sanitized(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }
}

pub fn hash_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
