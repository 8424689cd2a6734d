// handlers/mod.rs - two security tiers
//
// public     no authentication (/, /health)
// protected  bearer JWT plus an active session user (/api/*)

pub mod protected;
pub mod public;
