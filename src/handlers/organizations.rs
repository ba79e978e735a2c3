// /api/organizations handlers

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    errors::AppError,
    handlers::extract::{ApiJson, ApiPath},
    features::{
        auth::Claims,
        tenants::{
            Organization,
            model::{CreateOrganization, UpdateOrganization},
        },
    },
    state::AppState,
};

/// POST /api/organizations - admin only
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<CreateOrganization>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    claims.require_admin()?;
    let organization = state.tenants.create_organization(input).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

/// GET /api/organizations - admin only
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Organization>>, AppError> {
    claims.require_admin()?;
    Ok(Json(state.tenants.list_organizations().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(org_id): ApiPath<Uuid>,
) -> Result<Json<Organization>, AppError> {
    claims.authorize_member(org_id)?;
    Ok(Json(state.tenants.get_organization(org_id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateOrganization>,
) -> Result<Json<Organization>, AppError> {
    claims.authorize_owner(org_id)?;
    Ok(Json(state.tenants.update_organization(org_id, input).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(org_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    state.tenants.delete_organization(org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
