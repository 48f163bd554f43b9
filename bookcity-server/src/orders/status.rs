//! Order status transitions
//!
//! ```text
//! pending → confirmed → processing → shipped → delivered
//!    │          │           │           │          │
//!    └──────────┴───────────┴─────┬─────┴──────────┘
//!                                 ▼
//!                             cancelled (terminal, restores stock)
//! ```
//!
//! Forward moves may skip steps and the current status may be re-asserted.

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, PaymentStatus};
use sqlx::SqlitePool;

use super::{OrderError, OrderResult};
use crate::db::repository::{book, order};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_optional_text};

pub const ORDER_CANCELLED_COMMENT: &str = "Order cancelled";

/// Parse a status string from a request
pub fn parse_status(raw: &str) -> OrderResult<OrderStatus> {
    raw.trim()
        .parse()
        .map_err(|_| OrderError::InvalidStatus(raw.to_string()))
}

/// Whether the state machine allows `from → to`
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> OrderResult<()> {
    if from.is_cancelled() {
        return Err(OrderError::AlreadyCancelled);
    }
    match (from.progress_rank(), to.progress_rank()) {
        // Anything not yet cancelled may be cancelled
        (_, None) => Ok(()),
        (Some(current), Some(target)) if target >= current => Ok(()),
        _ => Err(OrderError::InvalidTransition { from, to }),
    }
}

/// Move an order to `target` and append a history entry.
///
/// Moving to `cancelled` puts every item's quantity back into stock in the
/// same transaction.
pub async fn transition(
    pool: &SqlitePool,
    order_id: i64,
    target: OrderStatus,
    comment: Option<String>,
    actor: Option<i64>,
) -> OrderResult<Order> {
    validate_optional_text(&comment, "comment", MAX_NOTE_LEN)?;
    let comment = normalize_optional(comment);

    let mut tx = pool.begin().await?;

    // Write first: takes the lock so the status read below cannot go stale
    if !order::touch(&mut tx, order_id).await? {
        return Err(OrderError::OrderNotFound(order_id));
    }
    let current = order::find_by_id(&mut *tx, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?;

    check_transition(current.status, target)?;

    if target.is_cancelled() {
        let items = order::items(&mut *tx, order_id).await?;
        for item in &items {
            book::increment_stock(&mut tx, item.book_id, item.quantity).await?;
        }
        tracing::info!(
            order_id = order_id,
            items = items.len(),
            "Stock restored for cancelled order"
        );
    }

    order::set_status(&mut tx, order_id, target).await?;
    order::append_status(&mut tx, order_id, target, comment.as_deref(), actor).await?;

    let updated = order::find_by_id(&mut *tx, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?;
    tx.commit().await?;

    tracing::info!(
        order_id = order_id,
        order_number = %updated.order_number,
        from = %current.status,
        to = %target,
        "Order status changed"
    );
    Ok(updated)
}

/// Cancel an order, restoring stock exactly once
pub async fn cancel(pool: &SqlitePool, order_id: i64, actor: Option<i64>) -> OrderResult<Order> {
    transition(
        pool,
        order_id,
        OrderStatus::Cancelled,
        Some(ORDER_CANCELLED_COMMENT.to_string()),
        actor,
    )
    .await
}

/// Set payment status (and optionally method). Status history is untouched.
pub async fn update_payment(
    pool: &SqlitePool,
    order_id: i64,
    payment_status: &str,
    payment_method: Option<String>,
) -> OrderResult<Order> {
    let payment_status: PaymentStatus = payment_status.trim().parse().map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidPaymentStatus,
            format!("Invalid payment status: {payment_status}"),
        )
        .with_detail("field", "payment_status")
    })?;
    validate_optional_text(&payment_method, "payment_method", MAX_SHORT_TEXT_LEN)?;
    let payment_method = normalize_optional(payment_method);

    if !order::update_payment(pool, order_id, payment_status, payment_method.as_deref()).await? {
        return Err(OrderError::OrderNotFound(order_id));
    }
    tracing::info!(order_id = order_id, payment_status = payment_status.as_str(), "Payment status updated");

    order::find_by_id(pool, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))
}
