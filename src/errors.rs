use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // Auth errors
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Missing authorization token")]
    MissingAuthToken,
    #[error("Invalid authorization header")]
    InvalidAuthHeader,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Token expired")]
    TokenExpired,

    // Request / domain errors
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),

    // Hot reload errors
    #[error("Hot reload error: {0}")]
    HotReloadError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::AuthFailed(_)
            | AppError::MissingAuthToken
            | AppError::InvalidAuthHeader
            | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::HotReloadError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::AuthFailed(_) => "AUTH_FAILED",
            AppError::MissingAuthToken => "MISSING_AUTH_TOKEN",
            AppError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AppError::InsufficientPermissions => "FORBIDDEN",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::HotReloadError(_) => "CONFIG_RELOAD_FAILED",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::RateLimited { .. } => "Too many requests".to_string(),
            AppError::AuthFailed(reason) => format!("Authentication failed: {}", reason),
            AppError::MissingAuthToken => "Missing 'Authorization' header".to_string(),
            AppError::InvalidAuthHeader => {
                "Invalid 'Authorization' header format. Expected 'Bearer <token>'.".to_string()
            }
            AppError::InsufficientPermissions => {
                "You do not have permission to access this resource.".to_string()
            }
            AppError::TokenExpired => "Token has expired".to_string(),
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::HotReloadError(msg) => {
                tracing::error!("Hot reload error: {}", msg);
                "Configuration reload failed".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": true,
            "code": self.error_code(),
            "message": self.client_message(),
        });

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
