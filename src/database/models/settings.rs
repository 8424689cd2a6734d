use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;

/// Runtime-mutable service settings persisted by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub enable_user_access_tokens: bool,
}

impl From<&ServiceConfig> for ServiceSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            enable_user_access_tokens: config.enable_user_access_tokens,
        }
    }
}

/// Partial update applied by administrators
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSettingsPatch {
    pub enable_user_access_tokens: Option<bool>,
}

impl ServiceSettings {
    pub fn apply(mut self, patch: &ServiceSettingsPatch) -> Self {
        if let Some(enabled) = patch.enable_user_access_tokens {
            self.enable_user_access_tokens = enabled;
        }
        self
    }
}
