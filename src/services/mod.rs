pub mod admin_service;
pub mod caller;

pub use admin_service::{
    AdminService, Page, ServiceError, PERMISSION_DENIED_MESSAGE, TOKENS_DISABLED_MESSAGE,
    TOKEN_NOT_FOUND_MESSAGE, USER_NOT_FOUND_MESSAGE,
};
pub use caller::Caller;
