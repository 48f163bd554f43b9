//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type every HTTP handler returns. The `message` is the
/// specific, human-readable reason (for example "Insufficient stock for: BK-1"),
/// while the code's default message names the failure class.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, offending SKU, ...)
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

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a validation error attributed to a single field
    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::with_message(ErrorCode::ValidationFailed, msg.clone())
            .with_detail("field", field)
            .with_detail("reason", msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a not authenticated error
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an invalid token error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Create a token expired error
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }
}

/// Outcome marker carried by every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Unified API response envelope
///
/// ```json
/// { "status": "error", "code": 6002, "message": "Insufficient stock",
///   "error": "Insufficient stock for: BK-001", "details": { "sku": "BK-001" } }
/// ```
///
/// Successful mutations that only need an acknowledgement use the same shape
/// with `status: "success"` and an optional `data` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    /// Error code (0 for success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Failure class or success message
    pub message: String,
    /// Specific failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    /// Create a success response with custom message and data
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: Some(0),
            message: message.into(),
            error: None,
            data: Some(data),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: Some(0),
            message: message.into(),
            error: None,
            data: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            status: ResponseStatus::Error,
            code: Some(err.code.code()),
            message: err.code.message().to_string(),
            error: Some(err.message.clone()),
            data: None,
            details: err.details.clone(),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::<()>::error(&self);

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

/// Split a JSON data error into the offending field path and its reason
///
/// `body` is the text after axum's "Failed to deserialize" prefix, for
/// example ``cart[0].quantity: invalid type: string "two", expected i64 at line 1 column 9``
/// or ``missing field `customer_name` at line 1 column 80``.
fn json_field_error(body: &str) -> (Option<String>, String) {
    let (path, reason) = match body.split_once(": ") {
        Some((path, rest)) if !path.contains(' ') => (Some(path.to_string()), rest),
        _ => (None, body),
    };
    let reason = reason
        .rsplit_once(" at line ")
        .map_or(reason, |(head, _)| head)
        .to_string();

    if let Some(rest) = reason.strip_prefix("missing field `")
        && let Some((name, _)) = rest.split_once('`')
    {
        let field = match path {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        let message = format!("{field} is required");
        return (Some(field), message);
    }
    let message = match &path {
        Some(field) => format!("{field}: {reason}"),
        None => reason,
    };
    (path, message)
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;

        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                let body = text
                    .split_once("target type: ")
                    .map_or(text.as_str(), |(_, rest)| rest);
                match json_field_error(body) {
                    (Some(field), message) => Self::field(&field, message),
                    (None, message) => Self::validation(message),
                }
            }
            JsonRejection::JsonSyntaxError(_) => Self::invalid_request("Request body is not valid JSON"),
            JsonRejection::MissingJsonContentType(_) => {
                Self::invalid_request("Expected request with `Content-Type: application/json`")
            }
            other => Self::invalid_request(other.body_text()),
        }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = match self.code {
            Some(0) | None => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::with_message(ErrorCode::InsufficientStock, "Insufficient stock for: A")
            .with_detail("sku", "A");
        assert_eq!(err.details.unwrap().get("sku").unwrap(), "A");
    }

    #[test]
    fn test_field_error() {
        let err = AppError::field("customer_email", "customer_email must be a valid email");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "customer_email");
    }

    #[test]
    fn test_json_field_error_missing_field() {
        let (field, message) =
            json_field_error("missing field `customer_name` at line 1 column 80");
        assert_eq!(field.as_deref(), Some("customer_name"));
        assert_eq!(message, "customer_name is required");

        let (field, _) = json_field_error("cart[0]: missing field `price` at line 1 column 30");
        assert_eq!(field.as_deref(), Some("cart[0].price"));
    }

    #[test]
    fn test_json_field_error_wrong_type() {
        let (field, message) = json_field_error(
            "cart[0].quantity: invalid type: string \"two\", expected i64 at line 1 column 9",
        );
        assert_eq!(field.as_deref(), Some("cart[0].quantity"));
        assert_eq!(message, "cart[0].quantity: invalid type: string \"two\", expected i64");

        let (field, message) = json_field_error("invalid type: integer `1`, expected a map");
        assert_eq!(field, None);
        assert_eq!(message, "invalid type: integer `1`, expected a map");
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = AppError::with_message(ErrorCode::InsufficientStock, "Insufficient stock for: A");
        let json = serde_json::to_value(ApiResponse::<()>::error(&err)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], 6002);
        assert_eq!(json["message"], "Insufficient stock");
        assert_eq!(json["error"], "Insufficient stock for: A");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_envelope_deserialize_without_optional_fields() {
        let json = r#"{"status":"error","message":"Validation failed"}"#;
        let response: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(!response.is_success());
        assert!(response.code.is_none());
    }
}
