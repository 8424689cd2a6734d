use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// System-level roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    SystemUser,
    /// Allows an ordinary user to manage access tokens for their own account
    SystemUserAccessToken,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "system_admin",
            Role::SystemUser => "system_user",
            Role::SystemUserAccessToken => "system_user_access_token",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system_admin" => Some(Role::SystemAdmin),
            "system_user" => Some(Role::SystemUser),
            "system_user_access_token" => Some(Role::SystemUserAccessToken),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: impl Into<String>, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            roles,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_system_admin(&self) -> bool {
        self.has_role(Role::SystemAdmin)
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Row shape of the `users` table; roles are stored as a text array
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            // Unknown role names are ignored rather than failing the whole lookup
            roles: row.roles.iter().filter_map(|r| Role::parse(r)).collect(),
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_names() {
        for role in [Role::SystemAdmin, Role::SystemUser, Role::SystemUserAccessToken] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("team_admin"), None);
    }

    #[test]
    fn row_conversion_drops_unknown_roles() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            username: "a".into(),
            roles: vec!["system_user".into(), "channel_admin".into()],
            created_at: Utc::now(),
            deleted_at: None,
        };
        let user = User::from(row);
        assert_eq!(user.roles, vec![Role::SystemUser]);
        assert!(!user.is_system_admin());
    }
}
