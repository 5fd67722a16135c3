//! Custom error types for the API service

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{chat::ChatError, storage::StorageError};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Too many requests, please try again later.")]
    TooManyRequests,

    /// Chat body without a usable `messages` array
    #[error("Invalid messages format")]
    InvalidMessages,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => message(StatusCode::BAD_REQUEST, &msg),
            ApiError::NotFound(msg) => message(StatusCode::NOT_FOUND, msg),
            ApiError::TooManyRequests => {
                message(StatusCode::TOO_MANY_REQUESTS, &self.to_string())
            }
            ApiError::InvalidMessages => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Database(e) => {
                error!("Catalog store failure: {}", e);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ApiError::Storage(StorageError::Io(e)) => {
                error!("Upload storage failure: {}", e);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ApiError::Storage(e) => message(StatusCode::BAD_REQUEST, &e.to_string()),
            ApiError::Chat(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to process chat request",
                    "details": e.to_string(),
                })),
            )
                .into_response(),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_failures_carry_details() {
        let response =
            ApiError::from(ChatError::Upstream("quota exceeded".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to process chat request");
        assert_eq!(body["details"], "Failed to generate response: quota exceeded");
    }

    #[tokio::test]
    async fn upload_rejections_are_bad_requests() {
        let response = ApiError::from(StorageError::NotAnImage).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Only image files are allowed!"
        );
    }

    #[tokio::test]
    async fn invalid_chat_bodies_use_the_error_key() {
        let response = ApiError::InvalidMessages.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid messages format");
    }

    #[tokio::test]
    async fn internal_causes_are_hidden() {
        let response = ApiError::from(DatabaseError::Migration("boom".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Internal server error");
    }
}
