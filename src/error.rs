use crate::db::ConnectionError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("Database unavailable: {0}")]
    Unavailable(#[from] ConnectionError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl AppError {
    fn database_kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::DatabaseError(e) => e.as_database_error().map(|d| d.kind()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match (&self, self.database_kind()) {
            (AppError::Unavailable(_), _) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "The database is currently unavailable.".to_string(),
            ),
            (AppError::DatabaseError(_), Some(ErrorKind::UniqueViolation)) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                "A record with the same unique value already exists.".to_string(),
            ),
            (AppError::DatabaseError(_), Some(ErrorKind::CheckViolation)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                "The request violates a data constraint.".to_string(),
            ),
            // Only `user_id` columns carry foreign keys: the account is gone.
            (AppError::DatabaseError(_), Some(ErrorKind::ForeignKeyViolation)) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required or token expired".to_string(),
            ),
            (AppError::DatabaseError(e), _) => {
                error!("database query failed: {}", e);
                internal()
            }
            (AppError::TokenError(e), _) => {
                error!("token signing failed: {}", e);
                internal()
            }
            (AppError::Unauthorized(msg), _) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string())
            }
            (AppError::Forbidden(msg), _) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.to_string()),
            (AppError::NotFound(msg), _) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            (AppError::Validation(msg), _) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
            }
        };

        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal server error occurred.".to_string(),
    )
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
