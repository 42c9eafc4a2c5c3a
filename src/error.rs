//! Error types shared by the token core, its collaborators and the HTTP layer.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures reported by a user directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("user not found")]
    NotFound,

    #[error("user already exists")]
    AlreadyExists,

    #[error("directory unavailable: {0}")]
    Backend(String),
}

/// Failures reported by a password hasher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    #[error("password does not match")]
    Mismatch,

    #[error("password hashing failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled by caller"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("password does not match")]
    PasswordMismatch,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("failed to sign token: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    #[error("malformed token: {0}")]
    TokenMalformed(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token")]
    InvalidToken,

    #[error("request {0}")]
    Cancelled(CancelReason),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::BadRequest(rejection.body_text())
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Mismatch => AuthError::PasswordMismatch,
            HashError::Failed(message) => AuthError::PasswordHash(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            // Unknown email and wrong password look the same from outside.
            AuthError::Directory(DirectoryError::NotFound) | AuthError::PasswordMismatch => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            AuthError::Directory(DirectoryError::AlreadyExists) => {
                (StatusCode::CONFLICT, "USER_EXISTS")
            }
            AuthError::Directory(DirectoryError::Backend(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DIRECTORY_UNAVAILABLE")
            }
            AuthError::PasswordHash(_) | AuthError::TokenSigning(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AuthError::TokenMalformed(_) => (StatusCode::BAD_REQUEST, "MALFORMED_TOKEN"),
            AuthError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AuthError::Cancelled(CancelReason::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED")
            }
            AuthError::Cancelled(CancelReason::DeadlineExceeded) => {
                (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match code {
            "INVALID_CREDENTIALS" => "invalid email or password".to_string(),
            "INTERNAL_ERROR" => {
                tracing::error!(error = %self, "internal error");
                "internal server error".to_string()
            }
            "DIRECTORY_UNAVAILABLE" => {
                tracing::error!(error = %self, "directory error");
                "user directory unavailable".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
