use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_client_ip::ClientIp;
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::{
    errors::AppError,
    features::rate_limiter::RateLimitDecision,
    middleware::get_rate_limit_policy,
    state::AppState,
    utils::logging::log_rate_limit_event,
};

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub async fn layer(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    let Some(policy) = get_rate_limit_policy(&state, req.uri().path()).await else {
        return next.run(req).await;
    };

    let key = format!("{}:{}", policy.name, client_ip);
    let decision = state
        .rate_limit_store
        .check_rate_limit(&key, policy.requests, policy.period);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        let retry_after_secs = decision.retry_after_secs();
        log_rate_limit_event(&key, req.uri().path(), policy.requests, retry_after_secs);
        AppError::RateLimited { retry_after_secs }.into_response()
    };

    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(decision.reset_after_secs()));
}
