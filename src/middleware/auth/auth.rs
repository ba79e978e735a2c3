use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{errors::AppError, features::auth::verify_token, state::AppState};

// axum middleware layer for authentication; handlers read `Extension<Claims>`
pub async fn layer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mode = state.config.read().await.identity.mode;

    // Only hold the key store lock for the lookup itself
    let claims = {
        let key_store = state.key_store.read().await;
        verify_token(req.headers(), mode, &state.secrets, &key_store)?
    };

    tracing::debug!(sub = %claims.sub, org = ?claims.org, "Authenticated request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
