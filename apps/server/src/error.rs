//! HTTP error mapping.
//!
//! Storage/validation failures surface as status-coded JSON responses.
//! Internal causes are logged, never leaked to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lectern_shared::LecternError;

/// API-level error, mapped to an HTTP status and JSON body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid credentials or token")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(cause) => {
                error!(%cause, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<LecternError> for ApiError {
    fn from(err: LecternError) -> Self {
        match err {
            LecternError::Auth(_) => Self::Unauthorized,
            LecternError::Validation { message } => Self::BadRequest(message),
            LecternError::Storage(msg) if msg.contains("already registered") => {
                Self::Conflict(msg)
            }
            LecternError::Storage(msg) if msg.contains("not found") => Self::NotFound(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
