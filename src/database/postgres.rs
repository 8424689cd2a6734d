use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{AccessToken, ServiceSettings, User, UserRow};
use crate::database::store::Store;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        roles TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_access_tokens (
        id TEXT PRIMARY KEY,
        token_hash TEXT NOT NULL UNIQUE,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Lookups match emails case-insensitively, so uniqueness must too
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_lower ON users (lower(email))",
    "CREATE INDEX IF NOT EXISTS idx_user_access_tokens_user_id ON user_access_tokens (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS service_settings (
        id SMALLINT PRIMARY KEY CHECK (id = 1),
        enable_user_access_tokens BOOLEAN NOT NULL
    )
    "#,
];

const USER_COLUMNS: &str = "id, email, username, roles, created_at, deleted_at";
const TOKEN_COLUMNS: &str = "id, user_id, description, created_at";

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the shared pool from `DatabaseManager`
    pub async fn connect() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::main_pool().await?))
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Applied {} schema statements", MIGRATIONS.len());
        Ok(())
    }

    async fn fetch_user(&self, filter: &str, value: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} AND deleted_at IS NULL",
            USER_COLUMNS, filter
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }
}

/// Unique and foreign-key violations surface as `Constraint`
fn map_write_error(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.code().as_deref(), Some("23505") | Some("23503")) {
            return DatabaseError::Constraint(db.message().to_string());
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.fetch_user("lower(email) = lower($1)", email).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.fetch_user("username = $1", username).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_string()).collect();
        sqlx::query(
            "INSERT INTO users (id, email, username, roles, created_at, deleted_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&roles)
        .bind(user.created_at)
        .bind(user.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn insert_access_token(&self, token: &AccessToken, token_hash: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_access_tokens (id, token_hash, user_id, description, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&token.id)
        .bind(token_hash)
        .bind(token.user_id)
        .bind(&token.description)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn get_access_token(&self, id: &str) -> Result<Option<AccessToken>, DatabaseError> {
        let sql = format!("SELECT {} FROM user_access_tokens WHERE id = $1", TOKEN_COLUMNS);
        let token = sqlx::query_as::<_, AccessToken>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn list_access_tokens_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AccessToken>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM user_access_tokens WHERE user_id = $1 ORDER BY created_at, id OFFSET $2 LIMIT $3",
            TOKEN_COLUMNS
        );
        let tokens = sqlx::query_as::<_, AccessToken>(&sql)
            .bind(user_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(tokens)
    }

    async fn delete_access_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM user_access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_settings(&self) -> Result<Option<ServiceSettings>, DatabaseError> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT enable_user_access_tokens FROM service_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(enable_user_access_tokens,)| ServiceSettings {
            enable_user_access_tokens,
        }))
    }

    async fn save_settings(&self, settings: &ServiceSettings) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO service_settings (id, enable_user_access_tokens) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET enable_user_access_tokens = EXCLUDED.enable_user_access_tokens
            "#,
        )
        .bind(settings.enable_user_access_tokens)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError as SqlxDatabaseError, ErrorKind};

    #[derive(Debug)]
    struct PgFailure {
        code: &'static str,
    }

    impl fmt::Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "pg error {}", self.code)
        }
    }

    impl StdError for PgFailure {}

    impl SqlxDatabaseError for PgFailure {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn failure(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code }))
    }

    #[test]
    fn unique_and_foreign_key_violations_become_constraints() {
        for code in ["23505", "23503"] {
            assert!(
                matches!(map_write_error(failure(code)), DatabaseError::Constraint(m) if m.contains("duplicate key")),
                "{}",
                code
            );
        }

        // not-null violation stays a plain sqlx error
        assert!(matches!(map_write_error(failure("23502")), DatabaseError::Sqlx(_)));
        assert!(matches!(map_write_error(sqlx::Error::RowNotFound), DatabaseError::Sqlx(_)));
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let lower_index = MIGRATIONS
            .iter()
            .find(|statement| statement.contains("UNIQUE INDEX") && statement.contains("lower(email)"));
        assert!(lower_index.is_some());

        // The index must come after the table it covers
        let table = MIGRATIONS.iter().position(|s| s.contains("CREATE TABLE IF NOT EXISTS users"));
        let index = MIGRATIONS.iter().position(|s| s.contains("idx_users_email_lower"));
        assert!(table.is_some() && table < index);
    }

    #[test]
    fn token_reads_never_select_the_hash() {
        assert!(!TOKEN_COLUMNS.contains("token_hash"));
        assert_eq!(TOKEN_COLUMNS, "id, user_id, description, created_at");
    }
}
