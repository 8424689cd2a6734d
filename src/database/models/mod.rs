pub mod access_token;
pub mod settings;
pub mod user;

pub use access_token::{hash_token, AccessToken};
pub use settings::{ServiceSettings, ServiceSettingsPatch};
pub use user::{Role, User, UserRow};
