use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(err) => match err {
                DatabaseError::NotFound => StatusCode::NOT_FOUND,
                DatabaseError::Duplicate => StatusCode::CONFLICT,
                DatabaseError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // Quota violations ride on 400; the message carries the detail.
            AppError::QuotaExceeded(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Storage and internal failures are
    /// collapsed to a generic message so no internal detail leaks.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(DatabaseError::NotFound) | AppError::NotFound(_) => {
                "Resource not found".to_string()
            }
            AppError::Database(DatabaseError::Duplicate) => "Resource already exists".to_string(),
            AppError::Database(DatabaseError::Sqlx(_)) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            }
            AppError::Authentication(_) => "Authentication required".to_string(),
            AppError::Forbidden(_) => "Access denied".to_string(),
            AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::QuotaExceeded(msg)
            | AppError::InvalidState(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.public_message() }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidState("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn quota_exceeded_is_a_bad_request_with_its_own_message() {
        let err = AppError::QuotaExceeded("Employee limit reached".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Employee limit reached");
    }

    #[test]
    fn storage_failures_do_not_leak_detail() {
        let err = AppError::Database(DatabaseError::Sqlx(sqlx::Error::PoolClosed));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "An internal server error occurred");
    }

    #[test]
    fn ownership_failures_read_identically_to_missing_rows() {
        let masked = AppError::NotFound("Enrollment not found".into());
        let missing = AppError::Database(DatabaseError::NotFound);
        assert_eq!(masked.status_code(), missing.status_code());
        assert_eq!(masked.public_message(), missing.public_message());
    }
}
