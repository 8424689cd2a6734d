use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Role, User};

/// The identity on whose behalf an operation runs.
///
/// `Local` is the in-process administrative channel and is trusted like a
/// system administrator. The tier is decided by the transport, never by the
/// operation itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Caller {
    Local,
    SystemAdmin { user_id: Uuid },
    Authenticated { user_id: Uuid, roles: Vec<Role> },
}

impl Caller {
    /// Tier for a session held by `user`
    pub fn for_user(user: &User) -> Self {
        if user.is_system_admin() {
            Caller::SystemAdmin { user_id: user.id }
        } else {
            Caller::Authenticated {
                user_id: user.id,
                roles: user.roles.clone(),
            }
        }
    }

    /// System administrators and the local channel may act on any user
    pub fn is_privileged(&self) -> bool {
        matches!(self, Caller::Local | Caller::SystemAdmin { .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::Local => None,
            Caller::SystemAdmin { user_id } | Caller::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        match self {
            Caller::Local => true,
            Caller::SystemAdmin { .. } => true,
            Caller::Authenticated { roles, .. } => roles.contains(&role),
        }
    }

    /// Whether the caller may manage access tokens owned by `owner`
    pub fn can_manage_tokens_of(&self, owner: Uuid) -> bool {
        self.is_privileged()
            || (self.user_id() == Some(owner) && self.has_role(Role::SystemUserAccessToken))
    }

    /// Short label for log lines
    pub fn describe(&self) -> String {
        match self {
            Caller::Local => "local".to_string(),
            Caller::SystemAdmin { user_id } => format!("system_admin:{}", user_id),
            Caller::Authenticated { user_id, .. } => format!("user:{}", user_id),
        }
    }
}
