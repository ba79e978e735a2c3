//! Core building blocks behind the HTTP layer.
//!
//! - `rate_limiter` - fixed-window request counting
//! - `cache` - TTL key/value cache
//! - `auth` - bearer token verification and tenant access checks
//! - `tenants` - organizations and their social connections

pub mod auth;
pub mod cache;
pub mod rate_limiter;
pub mod tenants;
