//! Order API Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ErrorCode, ResponseStatus};
use shared::models::{
    CheckoutRequest, Order, OrderDetail, OrderPlacedResponse, OrderQuery, PaymentUpdateRequest,
    StatusUpdateRequest,
};
use shared::pagination::{PageRequest, Paginated};

use crate::api::Json;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order::{self, OrderFilter};
use crate::orders::{self, status::parse_status};
use crate::utils::{AppError, AppResult};

/// Admin listing page size
const ADMIN_PER_PAGE: u32 = 15;
/// Customer history page size
const MY_ORDERS_PER_PAGE: u32 = 10;

const ORDER_PLACED_MESSAGE: &str = "Order placed successfully!";

fn order_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
}

/// POST /api/orders - checkout
pub async fn place(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<OrderPlacedResponse>)> {
    let placed = orders::place_order(&state.pool, &state.config.pricing, current.id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            status: ResponseStatus::Success,
            message: ORDER_PLACED_MESSAGE.to_string(),
            order: placed,
        }),
    ))
}

/// GET /api/orders (admin) - newest first, optional `status` filter
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Paginated<OrderDetail>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;
    let page = PageRequest::new(query.page, query.per_page, ADMIN_PER_PAGE);
    let filter = OrderFilter {
        user_id: None,
        status,
    };
    let (orders, total) = order::list(&state.pool, filter, page).await?;
    Ok(Json(Paginated::new(orders, total, page.page, page.per_page)))
}

/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Paginated<OrderDetail>>> {
    let page = PageRequest::new(query.page, Some(MY_ORDERS_PER_PAGE), MY_ORDERS_PER_PAGE);
    let filter = OrderFilter {
        user_id: Some(current.id),
        status: None,
    };
    let (orders, total) = order::list(&state.pool, filter, page).await?;
    Ok(Json(Paginated::new(orders, total, page.page, page.per_page)))
}

/// GET /api/orders/{id} - owner or admin; anyone else gets 404
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = order::find_detail(&state.pool, id)
        .await?
        .filter(|d| current.can_access_owner(d.order.user_id))
        .ok_or_else(|| order_not_found(id))?;
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/status (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdateRequest>,
) -> AppResult<Json<Order>> {
    let target = parse_status(&req.status)?;
    let updated = orders::transition(&state.pool, id, target, req.comment, Some(current.id)).await?;
    Ok(Json(updated))
}

/// PUT /api/orders/{id}/payment (admin)
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(req): Json<PaymentUpdateRequest>,
) -> AppResult<Json<Order>> {
    let updated =
        orders::update_payment(&state.pool, id, &req.payment_status, req.payment_method).await?;
    Ok(Json(updated))
}

/// DELETE /api/orders/{id} (admin) - cancel and restore stock
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let cancelled = orders::cancel(&state.pool, id, Some(current.id)).await?;
    Ok(Json(cancelled))
}
