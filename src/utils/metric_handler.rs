use std::sync::Arc;

use axum::extract::State;

use crate::{errors::AppError, state::AppState};

/// Prometheus scrape endpoint; 404 when metrics are disabled.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    state
        .prometheus_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::NotFound("metrics are disabled".to_string()))
}
