use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable error message
    pub detail: String,
}

/// Error type for all request handlers.
///
/// "Not found" and "not yours" share one variant, so a foreign row and a
/// missing one produce identical responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A unique field is already taken
    #[error("{0}")]
    Conflict(String),

    /// The request is well formed but violates a domain rule
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credentials, or an unknown subject
    #[error("{0}")]
    Unauthorized(String),

    /// Absent, or outside the caller's ownership chain
    #[error("{0}")]
    NotFound(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Runtime error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(error: DbErr) -> Self {
        // Races past the explicit uniqueness checks end up here.
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                warn!("Unique constraint violation: {}", message);
                ApiError::Conflict("A record with the same unique value already exists".to_string())
            }
            _ => ApiError::Database(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                warn!(status = status.as_u16(), "{}", other);
                other.to_string()
            }
        };

        let mut response = (status, Json(ErrorResponse { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Type alias for handler results
pub type ApiResult<T> = std::result::Result<T, ApiError>;
