//! Unified error handling for the HTTP surface.
//!
//! Every registry, middleware and handler failure is expressed as an [`AppError`].
//! Responses always carry a `{ "message": ... }` JSON body; server-side failures are
//! logged with their detail and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Application-level error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Login failure. Intentionally says nothing about which field was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired or unverifiable token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid identity with the wrong role, or a bad admin secret.
    #[error("{0}")]
    Forbidden(String),

    /// The operation targets a nonexistent id.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected internal failure. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Server(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::Validation(msg),
            other => Self::Server(other.to_string()),
        }
    }
}

/// ErrorBody
///
/// Wire shape of every error response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Server(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorBody { message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
