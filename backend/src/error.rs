//! Error handling for the Property Back Office
//!
//! Every failure is rendered as `{ "success": false, "error": ..., "code": ... }`

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors (upstream gate)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Sheet verification failed: {0}")]
    SheetVerificationFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-scoped validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService(_)
            | AppError::SheetVerificationFailed(_)
            | AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::SheetVerificationFailed(_) => "SHEET_VERIFICATION_FAILED",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the caller. Database and anyhow details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::Forbidden(msg) => msg.clone(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::ExternalService(msg) => msg.clone(),
            AppError::SheetVerificationFailed(msg) => {
                format!("Sheet verification failed: {}", msg)
            }
            AppError::Configuration(msg) => format!("Configuration error: {}", msg),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::Internal(msg) => msg.clone(),
            AppError::InternalError(_) => "An internal server error occurred".to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let field = match err {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        ErrorResponse {
            success: false,
            error: err.public_message(),
            code: err.code(),
            field,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<shared::ParseError> for AppError {
    fn from(err: shared::ParseError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::field(field, message)
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::field("quantity", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Property".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ExternalService("quota exceeded".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_external_message_is_preserved() {
        let err = AppError::ExternalService("Google Sheets API returned 429: quota".into());
        let body = ErrorResponse::from(&err);
        assert!(!body.success);
        assert_eq!(body.error, "Google Sheets API returned 429: quota");
        assert_eq!(body.code, "EXTERNAL_SERVICE_ERROR");
    }

    #[test]
    fn test_verification_failure_is_distinct() {
        let err = AppError::SheetVerificationFailed("timed out".into());
        assert_eq!(err.code(), "SHEET_VERIFICATION_FAILED");
        assert_ne!(err.code(), AppError::ExternalService("x".into()).code());
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error, "A database error occurred");
    }

    #[test]
    fn test_parse_error_becomes_validation() {
        let err: AppError = shared::ParseError::InvalidStatus("sent".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().contains("sent"));
    }

    #[test]
    fn test_field_is_serialized_only_for_validation() {
        let body = serde_json::to_value(ErrorResponse::from(&AppError::field(
            "quantity",
            "Quantity must be a non-negative number",
        )))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], "quantity");

        let body = serde_json::to_value(ErrorResponse::from(&AppError::NotFound(
            "Property".into(),
        )))
        .unwrap();
        assert!(body.get("field").is_none());
        assert_eq!(body["error"], "Property not found");
    }
}
