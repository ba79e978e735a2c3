//! Middleware module providing request processing layers.
//!
//! Available middleware:
//! - `auth` - JWT and API key authentication
//! - `rate_limiter` - Fixed-window rate limiting per policy and client IP
//! - `request_id` - Request tracing

pub mod auth;
pub mod rate_limiter;
pub mod request_id;

use std::sync::Arc;

use crate::{config::RateLimitPolicy, state::AppState};

/// Retrieves the rate limit policy for a given request path.
///
/// # Arguments
/// * `state` - Application state containing configuration
/// * `path` - Request URI path to match
///
/// # Returns
/// * `Option<Arc<RateLimitPolicy>>` - Policy if the path falls under one
pub async fn get_rate_limit_policy(state: &Arc<AppState>, path: &str) -> Option<Arc<RateLimitPolicy>> {
    let config_guard = state.config.read().await;
    config_guard.rate_limits.find_policy_for_path(path)
}
