pub mod auth;
pub mod server;
pub mod settings;
pub mod token;
pub mod user;
