use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{
    errors::AppError,
    features::{auth::Claims, tenants::TenantCacheStats},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RuntimeStats {
    pub rate_limit_windows: usize,
    pub caches: TenantCacheStats,
}

/// GET /api/admin/runtime - in-process limiter and cache counters
pub async fn runtime(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RuntimeStats>, AppError> {
    claims.require_admin()?;
    Ok(Json(RuntimeStats {
        rate_limit_windows: state.rate_limit_store.active_windows(),
        caches: state.tenants.cache_stats(),
    }))
}
