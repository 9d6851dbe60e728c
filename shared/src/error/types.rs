//! Error type and its JSON error body

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// The `message` is safe to show to a guest (it ends up in flash messages
/// and JSON bodies); causes that must stay server-side are logged where the
/// error is created instead.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create an invalid format error (malformed date, id, ...)
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidFormat, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }
}

/// JSON body of an error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ErrorResponse::from(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::RoomUnavailable);
        assert_eq!(err.code, ErrorCode::RoomUnavailable);
        assert_eq!(err.message, "Room is not available for those dates");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::invalid_format("Can't parse start date")
            .with_detail("field", "start")
            .with_detail("reason", "format");

        assert_eq!(err.code, ErrorCode::InvalidFormat);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "start");
        assert_eq!(details.get("reason").unwrap(), "format");
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::not_found("Reservation");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Reservation not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));

        let err = AppError::invalid_format("can't parse start date");
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            AppError::invalid_credentials().message,
            "Invalid login credentials"
        );
        assert_eq!(
            AppError::new(ErrorCode::DatabaseError).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::NotFound, "Room 7 not found");
        assert_eq!(format!("{}", err), "Room 7 not found");
    }

    #[test]
    fn test_error_response_body() {
        let err = AppError::new(ErrorCode::CsrfTokenInvalid).with_detail("path", "/book");
        let body = ErrorResponse::from(&err);

        assert_eq!(body.code, 9);
        assert_eq!(body.message, "Invalid or missing form token");
        assert!(body.details.is_some());
    }

    #[test]
    fn test_error_response_serialize() {
        let body = ErrorResponse::from(&AppError::new(ErrorCode::RoomNotFound));
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"code\":4001"));
        assert!(!json.contains("details"));
    }
}
