//! JSON route handlers. Authentication has already run; each handler checks
//! tenant access against the caller's `Claims`.

pub mod admin;
pub mod connections;
pub mod extract;
pub mod organizations;
