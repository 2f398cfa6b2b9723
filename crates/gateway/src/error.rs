//! API error type: maps domain errors onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use guildhall_database::{ChatError, SocialError};

/// An error response with a status code and a JSON `{"error": ..}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        let status = match &error {
            ChatError::UserNotFound | ChatError::GuildNotFound => StatusCode::NOT_FOUND,
            ChatError::Forbidden => StatusCode::FORBIDDEN,
            ChatError::InvalidScope(_) | ChatError::InvalidPageToken => StatusCode::BAD_REQUEST,
            ChatError::Database(detail) => {
                tracing::error!(%detail, "chat operation failed");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            }
        };
        Self::new(status, error.to_string())
    }
}

impl From<SocialError> for ApiError {
    fn from(error: SocialError) -> Self {
        let status = match &error {
            SocialError::UserNotFound
            | SocialError::GuildNotFound
            | SocialError::EntryNotFound
            | SocialError::RequestNotFound => StatusCode::NOT_FOUND,
            SocialError::RequestNotPending | SocialError::AlreadyExists => StatusCode::CONFLICT,
            SocialError::NotMember | SocialError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            SocialError::Database(detail) => {
                tracing::error!(%detail, "social operation failed");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            }
        };
        Self::new(status, error.to_string())
    }
}
