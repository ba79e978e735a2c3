pub mod auth;

pub use auth::{Claims, check_roles, verify_token};
