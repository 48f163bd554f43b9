//! Order processing
//!
//! - **checkout**: validates a cart and places an order in one transaction
//! - **status**: status state machine, cancellation with stock restore, payment
//! - **number**: order number formatting
//!
//! # Checkout flow
//!
//! ```text
//! CheckoutRequest → validate → BEGIN
//!     next_sequence (takes write lock)
//!     load books, check price and stock
//!     insert order → insert items + conditional stock decrement
//!     append "pending" history
//! COMMIT → PlacedOrder
//! ```
//!
//! Any error drops the transaction, which rolls everything back.

pub mod checkout;
pub mod number;
pub mod status;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

use crate::db::repository::RepoError;

pub use checkout::place_order;
pub use status::{cancel, check_transition, transition, update_payment};

/// Tax and shipping applied at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    /// Fraction of the subtotal, e.g. 0.05
    pub tax_rate: Decimal,
    /// Flat amount added per order
    pub shipping_cost: Decimal,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            tax_rate: shared::money::DEFAULT_TAX_RATE,
            shipping_cost: Decimal::ZERO,
        }
    }
}

/// Order processing errors
#[derive(Debug, Error)]
pub enum OrderError {
    /// Input failed validation before anything was written
    #[error("{0}")]
    Invalid(#[from] AppError),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Book not found: {0}")]
    BookNotFound(i64),

    #[error("Book is not available for purchase: {0}")]
    BookInactive(String),

    #[error("Insufficient stock for: {sku}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    #[error("Price changed for: {sku}")]
    PriceMismatch {
        sku: String,
        submitted: Decimal,
        current: Decimal,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Repo(RepoError::from(err))
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Invalid(e) => e,
            OrderError::EmptyCart => {
                AppError::with_message(ErrorCode::OrderEmpty, "Cart cannot be empty")
                    .with_detail("field", "cart")
            }
            OrderError::BookNotFound(id) => {
                AppError::with_message(ErrorCode::BookNotFound, format!("Book {id} not found"))
                    .with_detail("book_id", id)
            }
            OrderError::BookInactive(sku) => AppError::with_message(
                ErrorCode::BookInactive,
                format!("Book is not available for purchase: {sku}"),
            )
            .with_detail("sku", sku),
            OrderError::InsufficientStock {
                sku,
                requested,
                available,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!("Insufficient stock for: {sku}"),
            )
            .with_detail("sku", sku)
            .with_detail("requested", requested)
            .with_detail("available", available),
            OrderError::PriceMismatch {
                sku,
                submitted,
                current,
            } => AppError::with_message(
                ErrorCode::PriceMismatch,
                format!("Price changed for: {sku}"),
            )
            .with_detail("sku", sku)
            .with_detail("submitted", submitted.to_string())
            .with_detail("current", current.to_string()),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
            }
            OrderError::InvalidStatus(raw) => AppError::with_message(
                ErrorCode::InvalidOrderStatus,
                format!("Invalid order status: {raw}"),
            )
            .with_detail("field", "status"),
            OrderError::AlreadyCancelled => AppError::new(ErrorCode::OrderAlreadyCancelled),
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Cannot move order from {from} to {to}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            OrderError::Repo(e) => e.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_insufficient_stock_maps_to_422_with_sku() {
        let err: AppError = OrderError::InsufficientStock {
            sku: "TB-001".into(),
            requested: 2,
            available: 1,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("TB-001"));
        let details = err.details.unwrap();
        assert_eq!(details["available"], 1);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrderError::EmptyCart, StatusCode::UNPROCESSABLE_ENTITY),
            (OrderError::BookNotFound(9), StatusCode::NOT_FOUND),
            (OrderError::OrderNotFound(9), StatusCode::NOT_FOUND),
            (OrderError::AlreadyCancelled, StatusCode::CONFLICT),
            (
                OrderError::InvalidTransition {
                    from: OrderStatus::Shipped,
                    to: OrderStatus::Pending,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                OrderError::Repo(RepoError::Database("disk I/O error".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).http_status(), status);
        }
    }

    #[test]
    fn test_database_error_message_is_generic() {
        let err: AppError = OrderError::Repo(RepoError::Database("no such table: orders".into())).into();
        assert!(!err.message.contains("orders"));
    }
}
