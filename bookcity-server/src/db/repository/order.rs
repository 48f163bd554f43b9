//! Order Repository
//!
//! Orders, their items and status history. Nothing here deletes rows.

use shared::models::{
    Order, OrderDetail, OrderItem, OrderStatus, OrderStatusEntry, PaymentStatus,
};
use shared::money::from_minor_units;
use shared::pagination::PageRequest;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use super::RepoResult;

const ORDER_SELECT: &str = "SELECT id, user_id, order_number, customer_name, customer_email, customer_phone, shipping_address, city, state, postal_code, subtotal_cents, tax_amount_cents, shipping_cost_cents, total_amount_cents, payment_method, payment_status, status, notes, created_at, updated_at FROM orders";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    shipping_address: String,
    city: String,
    state: String,
    postal_code: String,
    subtotal_cents: i64,
    tax_amount_cents: i64,
    shipping_cost_cents: i64,
    total_amount_cents: i64,
    payment_method: Option<String>,
    payment_status: PaymentStatus,
    status: OrderStatus,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            order_number: row.order_number,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            shipping_address: row.shipping_address,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            subtotal: from_minor_units(row.subtotal_cents),
            tax_amount: from_minor_units(row.tax_amount_cents),
            shipping_cost: from_minor_units(row.shipping_cost_cents),
            total_amount: from_minor_units(row.total_amount_cents),
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    book_id: i64,
    book_title: String,
    book_sku: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            book_id: row.book_id,
            book_title: row.book_title,
            book_sku: row.book_sku,
            quantity: row.quantity,
            unit_price: from_minor_units(row.unit_price_cents),
            total_price: from_minor_units(row.total_price_cents),
        }
    }
}

/// Order header ready for insertion (money in minor units)
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: Option<i64>,
    pub order_number: &'a str,
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub customer_phone: Option<&'a str>,
    pub shipping_address: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub subtotal_cents: i64,
    pub tax_amount_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_amount_cents: i64,
    pub notes: Option<&'a str>,
}

/// Order line ready for insertion
#[derive(Debug, Clone)]
pub struct NewOrderItem<'a> {
    pub book_id: i64,
    pub book_title: &'a str,
    pub book_sku: &'a str,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// Bump the order counter and return the new value.
///
/// This is a write, so a transaction that starts with it holds the SQLite
/// write lock from here until commit.
pub async fn next_sequence(conn: &mut SqliteConnection) -> RepoResult<i64> {
    let value = sqlx::query_scalar::<_, i64>(
        "UPDATE order_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
    )
    .fetch_one(conn)
    .await?;
    Ok(value)
}

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO orders (user_id, order_number, customer_name, customer_email, customer_phone, shipping_address, city, state, postal_code, \
         subtotal_cents, tax_amount_cents, shipping_cost_cents, total_amount_cents, payment_status, status, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 'pending', 'pending', ?14, ?15, ?15)",
    )
    .bind(order.user_id)
    .bind(order.order_number)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(order.shipping_address)
    .bind(order.city)
    .bind(order.state)
    .bind(order.postal_code)
    .bind(order.subtotal_cents)
    .bind(order.tax_amount_cents)
    .bind(order.shipping_cost_cents)
    .bind(order.total_amount_cents)
    .bind(order.notes)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewOrderItem<'_>,
) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO order_items (order_id, book_id, book_title, book_sku, quantity, unit_price_cents, total_price_cents) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(item.book_id)
    .bind(item.book_title)
    .bind(item.book_sku)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Append a history entry
pub async fn append_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    comment: Option<&str>,
    changed_by: Option<i64>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO order_statuses (order_id, status, comment, changed_by, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(status)
    .bind(comment)
    .bind(changed_by)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Set the denormalized current status. Returns `false` if the order is missing.
pub async fn set_status(conn: &mut SqliteConnection, order_id: i64, status: OrderStatus) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Touch `updated_at`. As the first statement of a transaction this takes the
/// write lock before any read; returns `false` if the order is missing.
pub async fn touch(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE orders SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn update_payment(
    pool: &SqlitePool,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = ?, payment_method = COALESCE(?, payment_method), updated_at = ? WHERE id = ?",
    )
    .bind(payment_status)
    .bind(payment_method)
    .bind(now)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn find_by_id(executor: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(Order::from))
}

pub async fn items(executor: impl SqliteExecutor<'_>, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, order_id, book_id, book_title, book_sku, quantity, unit_price_cents, total_price_cents \
         FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
}

/// History, oldest first. Ordered by id so same-millisecond entries keep insertion order.
pub async fn history(
    executor: impl SqliteExecutor<'_>,
    order_id: i64,
) -> RepoResult<Vec<OrderStatusEntry>> {
    let rows = sqlx::query_as::<_, OrderStatusEntry>(
        "SELECT id, order_id, status, comment, changed_by, created_at FROM order_statuses WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Order with items and history
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = items(pool, id).await?;
    let status_history = history(pool, id).await?;
    Ok(Some(OrderDetail {
        order,
        items,
        status_history,
    }))
}

/// Filters for [`list`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

/// Newest first, with items and history, plus the total count
pub async fn list(
    pool: &SqlitePool,
    filter: OrderFilter,
    page: PageRequest,
) -> RepoResult<(Vec<OrderDetail>, u64)> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(ORDER_SELECT);
    select.push(" WHERE 1 = 1");
    push_filter(&mut select, filter);
    select
        .push(" ORDER BY id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = select.build_query_as::<OrderRow>().fetch_all(pool).await?;

    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        let order = Order::from(row);
        let items = items(pool, order.id).await?;
        let status_history = history(pool, order.id).await?;
        details.push(OrderDetail {
            order,
            items,
            status_history,
        });
    }
    Ok((details, total as u64))
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: OrderFilter) {
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}
