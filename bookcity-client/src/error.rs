//! Client error types

use std::collections::HashMap;

use ::http::StatusCode;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Error envelope returned by the server
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<HashMap<String, Value>>,
}

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected the request with a coded error
    #[error("API error {code}: {message}")]
    Api {
        code: u16,
        message: String,
        details: Option<HashMap<String, Value>>,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file error (cart persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Server error code, when the server sent one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { code, .. } => ErrorCode::try_from(*code).ok(),
            _ => None,
        }
    }

    /// Map a non-success response body to an error
    ///
    /// The server's envelope is preferred; anything else falls back to the
    /// HTTP status.
    pub(crate) fn from_response(status: StatusCode, body: &[u8]) -> Self {
        if let Ok(api_err) = serde_json::from_slice::<ApiErrorResponse>(body) {
            return Self::Api {
                code: api_err.code,
                message: api_err.error.unwrap_or(api_err.message),
                details: api_err.details,
            };
        }
        let text = String::from_utf8_lossy(body).to_string();
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(text),
            StatusCode::FORBIDDEN => Self::Forbidden(text),
            StatusCode::NOT_FOUND => Self::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(text),
            _ => Self::Internal(text),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api {
                code,
                message,
                details,
            } => {
                let code = ErrorCode::try_from(code).unwrap_or(ErrorCode::Unknown);
                let mut app = AppError::with_message(code, message);
                app.details = details;
                app
            }
            ClientError::Http(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, e.to_string())
            }
            ClientError::Http(e) => AppError::with_message(ErrorCode::NetworkError, e.to_string()),
            ClientError::Unauthorized(msg) => AppError::with_message(ErrorCode::NotAuthenticated, msg),
            ClientError::Forbidden(msg) => AppError::with_message(ErrorCode::PermissionDenied, msg),
            ClientError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            ClientError::Validation(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
            other => AppError::with_message(ErrorCode::InternalError, other.to_string()),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_becomes_api_error() {
        let body = br#"{"status":"error","code":6002,"message":"Insufficient stock",
            "error":"Insufficient stock for: TK-001","details":{"sku":"TK-001","available":1}}"#;
        let err = ClientError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);

        assert_eq!(err.code(), Some(ErrorCode::InsufficientStock));
        match &err {
            ClientError::Api { message, details, .. } => {
                assert_eq!(message, "Insufficient stock for: TK-001");
                assert_eq!(details.as_ref().unwrap()["available"], 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientStock);
        assert_eq!(app.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(app.details.unwrap().contains_key("sku"));
    }

    #[test]
    fn test_plain_body_falls_back_to_status() {
        let err = ClientError::from_response(StatusCode::NOT_FOUND, b"no route");
        assert!(matches!(err, ClientError::NotFound(ref t) if t == "no route"));
        assert_eq!(err.code(), None);

        let err = ClientError::from_response(StatusCode::BAD_GATEWAY, b"");
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
    }
}
