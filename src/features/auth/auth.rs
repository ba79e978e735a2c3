use std::collections::HashSet;

use http::HeaderMap;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{ApiKeyStore, AuthMode, SecretsConfig},
    errors::AppError,
};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OWNER: &str = "owner";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String, // Subject (User Id)
    /// Organization the caller belongs to.
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize, // Required for JWT validation
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn belongs_to(&self, organization_id: Uuid) -> bool {
        self.org
            .as_deref()
            .and_then(|org| Uuid::parse_str(org).ok())
            .is_some_and(|org| org == organization_id)
    }

    /// Platform admins, or any member of the organization.
    pub fn authorize_member(&self, organization_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || self.belongs_to(organization_id) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Platform admins, or an `owner` of the organization.
    pub fn authorize_owner(&self, organization_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || (self.belongs_to(organization_id) && self.has_role(ROLE_OWNER)) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        check_roles(&self.roles, &[ROLE_ADMIN.to_string()])
    }
}

pub fn verify_token(
    headers: &HeaderMap,
    mode: AuthMode,
    secrets: &SecretsConfig,
    key_store: &ApiKeyStore,
) -> Result<Claims, AppError> {
    let token = extract_bearer_token(headers)?;

    match mode {
        AuthMode::Jwt => verify_jwt(token, secrets),
        AuthMode::ApiKey => verify_api_key(token, key_store),
        AuthMode::Either if key_store.keys.contains_key(token) => verify_api_key(token, key_store),
        AuthMode::Either => verify_jwt(token, secrets),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::MissingAuthToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::InvalidAuthHeader)
}

pub fn check_roles(user_roles: &[String], required_roles: &[String]) -> Result<(), AppError> {
    let user_roles_set: HashSet<_> = user_roles.iter().collect();
    for required_role in required_roles {
        if !user_roles_set.contains(required_role) {
            return Err(AppError::InsufficientPermissions);
        }
    }
    Ok(())
}

// ------- Private Helper Functions  -----

fn verify_jwt(token: &str, secrets: &SecretsConfig) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secrets.jwt_secret.as_ref());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::AuthFailed("Invalid JWT.".to_string()),
        })
        .map(|token_data| token_data.claims)
}

fn verify_api_key(token: &str, key_store: &ApiKeyStore) -> Result<Claims, AppError> {
    let details = key_store
        .keys
        .get(token)
        .ok_or_else(|| AppError::AuthFailed("Invalid API Key.".to_string()))?;

    if details.status != "active" {
        return Err(AppError::AuthFailed("API Key is revoked.".to_string()));
    }

    Ok(Claims {
        sub: details.user_id.clone(),
        org: details.org_id.clone(),
        roles: details.roles.clone(),
        exp: 0, // Not applicable for API keys
    })
}
