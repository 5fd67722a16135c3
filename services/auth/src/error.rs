//! Error type for the identity API and the authentication gate

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, malformed, or unverifiable bearer token
    #[error("Please authenticate")]
    Unauthenticated,

    /// Authenticated, but not an admin
    #[error("Admin access required")]
    AdminRequired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Admin login attempted by a regular account
    #[error("Access denied. Admin privileges required.")]
    NotAnAdmin,

    #[error("Invalid admin secret key")]
    InvalidAdminSecret,

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// Request body failed validation
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Hashing or signing failed
    #[error("Internal server error")]
    Internal,
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AdminRequired | AuthError::NotAnAdmin | AuthError::InvalidAdminSecret => {
                StatusCode::FORBIDDEN
            }
            AuthError::EmailTaken | AuthError::InvalidResetToken | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Database(e) => {
                error!("Identity store failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Type alias for identity results
pub type AuthResult<T> = Result<T, AuthError>;
