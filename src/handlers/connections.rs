// /api/organizations/{org_id}/connections handlers
//
// Reads are open to every member of the organization, writes need an owner.
// Stored access tokens never leave the service.

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    errors::AppError,
    handlers::extract::{ApiJson, ApiPath},
    features::{
        auth::Claims,
        tenants::{Platform, SocialConnectionView, model::UpsertConnection},
    },
    state::AppState,
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(org_id): ApiPath<Uuid>,
) -> Result<Json<Vec<SocialConnectionView>>, AppError> {
    claims.authorize_member(org_id)?;
    Ok(Json(state.tenants.list_connections(org_id).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath((org_id, platform)): ApiPath<(Uuid, Platform)>,
) -> Result<Json<SocialConnectionView>, AppError> {
    claims.authorize_member(org_id)?;
    Ok(Json(state.tenants.get_connection(org_id, platform).await?))
}

pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath((org_id, platform)): ApiPath<(Uuid, Platform)>,
    ApiJson(input): ApiJson<UpsertConnection>,
) -> Result<Json<SocialConnectionView>, AppError> {
    claims.authorize_owner(org_id)?;
    Ok(Json(state.tenants.upsert_connection(org_id, platform, input).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath((org_id, platform)): ApiPath<(Uuid, Platform)>,
) -> Result<StatusCode, AppError> {
    claims.authorize_owner(org_id)?;
    state.tenants.delete_connection(org_id, platform).await?;
    Ok(StatusCode::NO_CONTENT)
}
