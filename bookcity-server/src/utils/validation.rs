//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use validator::ValidateEmail;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Person names, book titles
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, status comments
pub const MAX_NOTE_LEN: usize = 2000;

/// Short identifiers: phone, postal code, SKU, city, state
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Minimum password length at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Shipping addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::field(field, format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.chars().count()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        ));
    }
    Ok(())
}

/// Validate a required, syntactically valid email address.
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_EMAIL_LEN)?;
    if !value.trim().validate_email() {
        return Err(AppError::field(
            field,
            format!("{field} must be a valid email address"),
        ));
    }
    Ok(())
}

/// Trim and drop empty optional strings
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Ravi", "customer_name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "customer_name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "customer_name is required");
        assert!(validate_required_text(&"x".repeat(201), "customer_name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_tamil_text_counts_chars_not_bytes() {
        // 7 code points, 21 bytes in UTF-8
        let title = "தமிழ்நூ";
        assert!(validate_required_text(title, "title_ta", 7).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 5).is_ok());
        assert!(validate_optional_text(&Some("123456".into()), "notes", 5).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("reader@example.com", "customer_email").is_ok());
        assert!(validate_email("not-an-email", "customer_email").is_err());
        assert!(validate_email("", "customer_email").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" 044 ".into())), Some("044".into()));
    }
}
