// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware and
// validate_user_middleware. Every handler receives the resolved `Caller`;
// permission policy lives in the service, not here.

pub mod config;
pub mod tokens;
pub mod users;
