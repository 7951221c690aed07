use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;
use crate::validation::ValidationError;

/// Every failure a request can end in, mapped to a status code in one place.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request body could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body could not be read, e.g. it exceeded the size limit.
    #[error("Unreadable body: {0}")]
    Body(#[from] BytesRejection),

    /// The payload parsed but did not satisfy its schema.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store rejected the write because of an integrity constraint.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Runtime error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Body(rejection) => rejection.status(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            AppError::BadRequest(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => Value::String(message),
            AppError::Validation(detail) => detail.to_value(),
            AppError::Body(rejection) => Value::String(rejection.body_text()),
            AppError::Database(db_error) => {
                error!("Unhandled database error: {}", db_error);
                Value::String("internal server error".to_string())
            }
            AppError::Internal(message) => {
                error!("Internal error: {}", message);
                Value::String("internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// True when the store refused a write because a unique key already exists.
pub fn is_unique_violation(db_error: &DbErr) -> bool {
    matches!(
        db_error.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    )
}

/// True for any integrity failure: unique or foreign key.
pub fn is_integrity_violation(db_error: &DbErr) -> bool {
    matches!(
        db_error.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_)) | Some(SqlErr::ForeignKeyConstraintViolation(_))
    )
}
