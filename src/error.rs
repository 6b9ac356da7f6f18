// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::TokenError;
use crate::authz::AuthzError;
use crate::database::StorageError;

/// HTTP API error with appropriate status codes and client-friendly messages.
/// Each core error kind keeps a distinct code so callers can tell
/// "unauthorized", "service unavailable" and "replay detected" apart.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 409 Conflict (delegation token replay)
    Replay(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Replay(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Replay(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Replay(_) => "TOKEN_REPLAYED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn replay(message: impl Into<String>) -> Self {
        ApiError::Replay(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        // Log the real error but return generic message
        tracing::error!("Storage error: {}", err);
        match err {
            StorageError::Timeout(_) => ApiError::service_unavailable("Identity store timed out"),
            StorageError::Conflict(_) => ApiError::internal_server_error("Identity store rejected a conflicting write"),
            _ => ApiError::service_unavailable("Identity store temporarily unavailable"),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Storage(e) => e.into(),
            TokenError::Key(e) => {
                tracing::error!("Signing key error: {}", e);
                ApiError::internal_server_error("Token signing is unavailable")
            }
            TokenError::Validation(reason) => ApiError::unauthorized(format!("Token is not active: {}", reason)),
            TokenError::ConsumptionConflict(_) => ApiError::replay("Token has already been used"),
            TokenError::InvalidRequest(msg) => ApiError::bad_request(msg),
            TokenError::InvalidTtl(ttl) => {
                tracing::error!("Configured token lifetime {} minutes is unusable", ttl);
                ApiError::internal_server_error("Token issuance is misconfigured")
            }
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Storage(e) => e.into(),
            AuthzError::InvalidSite(site) => ApiError::bad_request(format!("Invalid menu site '{}'", site)),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
