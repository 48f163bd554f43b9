//! Unified error codes for BookCity
//!
//! Error codes are shared by the server and the client library and are
//! organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors (65xx: bulk import)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request (malformed body, bad query string)
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Email address is already registered
    EmailAlreadyRegistered = 1005,
    /// Password does not meet the minimum length
    PasswordTooShort = 1006,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Cart has no lines
    OrderEmpty = 4002,
    /// Order is already cancelled
    OrderAlreadyCancelled = 4003,
    /// Status change is not allowed from the current status
    InvalidStatusTransition = 4004,
    /// Status value is outside the known enumeration
    InvalidOrderStatus = 4005,
    /// Client price does not match the catalog price
    PriceMismatch = 4006,
    /// Cart quantity is not a positive integer within bounds
    InvalidQuantity = 4007,
    /// Payment status value is outside the known enumeration
    InvalidPaymentStatus = 4008,

    // ==================== 6xxx: Catalog ====================
    /// Book not found
    BookNotFound = 6001,
    /// Requested quantity exceeds stock
    InsufficientStock = 6002,
    /// SKU already exists
    SkuExists = 6003,
    /// Book is not available for purchase
    BookInactive = 6004,
    /// Price is negative or has more than two decimal places
    InvalidPrice = 6005,

    // ==================== 65xx: Bulk import ====================
    /// Upload has no file field
    NoFileProvided = 6501,
    /// Uploaded file exceeds the size limit
    FileTooLarge = 6502,
    /// Uploaded file is not CSV
    UnsupportedFileType = 6503,
    /// One or more import rows failed validation
    ImportRowsInvalid = 6504,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Network error (client side)
    NetworkError = 9101,
    /// Request timed out
    TimeoutError = 9102,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Cart is empty",
            ErrorCode::OrderAlreadyCancelled => "Order is already cancelled",
            ErrorCode::InvalidStatusTransition => "Status transition not allowed",
            ErrorCode::InvalidOrderStatus => "Invalid order status",
            ErrorCode::PriceMismatch => "Price does not match the catalog",
            ErrorCode::InvalidQuantity => "Invalid quantity",
            ErrorCode::InvalidPaymentStatus => "Invalid payment status",

            // Catalog
            ErrorCode::BookNotFound => "Book not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::SkuExists => "SKU already exists",
            ErrorCode::BookInactive => "Book is not available",
            ErrorCode::InvalidPrice => "Invalid price",

            // Bulk import
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileType => "Unsupported file type",
            ErrorCode::ImportRowsInvalid => "Import failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::EmailAlreadyRegistered),
            1006 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderAlreadyCancelled),
            4004 => Ok(ErrorCode::InvalidStatusTransition),
            4005 => Ok(ErrorCode::InvalidOrderStatus),
            4006 => Ok(ErrorCode::PriceMismatch),
            4007 => Ok(ErrorCode::InvalidQuantity),
            4008 => Ok(ErrorCode::InvalidPaymentStatus),

            // Catalog
            6001 => Ok(ErrorCode::BookNotFound),
            6002 => Ok(ErrorCode::InsufficientStock),
            6003 => Ok(ErrorCode::SkuExists),
            6004 => Ok(ErrorCode::BookInactive),
            6005 => Ok(ErrorCode::InvalidPrice),

            // Bulk import
            6501 => Ok(ErrorCode::NoFileProvided),
            6502 => Ok(ErrorCode::FileTooLarge),
            6503 => Ok(ErrorCode::UnsupportedFileType),
            6504 => Ok(ErrorCode::ImportRowsInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::NetworkError),
            9102 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
