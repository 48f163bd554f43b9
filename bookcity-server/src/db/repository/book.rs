//! Book Repository

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{BookDetail, BookSummary, TITLE_NOT_AVAILABLE, Translation, TranslationText};
use shared::money::from_minor_units;
use shared::pagination::PageRequest;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{RepoError, RepoResult};

const BOOK_SELECT: &str = "SELECT id, sku, price_cents, stock_quantity, image_path, is_active, created_at, updated_at FROM books";

/// Book row (price in minor units)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub sku: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    pub fn price(&self) -> Decimal {
        from_minor_units(self.price_cents)
    }
}

/// Insert payload, already validated
#[derive(Debug, Clone)]
pub struct NewBook<'a> {
    pub sku: &'a str,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub image_path: Option<&'a str>,
    pub is_active: bool,
}

/// Column changes for an update; `None` leaves the column as is
#[derive(Debug, Clone, Default)]
pub struct BookChanges<'a> {
    pub sku: Option<&'a str>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub image_path: Option<&'a str>,
    pub is_active: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    sku: String,
    price_cents: i64,
    stock_quantity: i64,
    image_path: Option<String>,
    is_active: bool,
    created_at: i64,
    title: Option<String>,
    description: Option<String>,
}

impl From<SummaryRow> for BookSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            price: from_minor_units(row.price_cents),
            stock_quantity: row.stock_quantity,
            in_stock: row.stock_quantity > 0,
            title: row.title.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string()),
            description: row.description,
            image: row.image_path,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Active books projected into `locale`, oldest first, plus the total count
pub async fn list_active(
    pool: &SqlitePool,
    locale: &str,
    page: PageRequest,
) -> RepoResult<(Vec<BookSummary>, u64)> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books WHERE is_active = 1")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, SummaryRow>(
        "SELECT b.id, b.sku, b.price_cents, b.stock_quantity, b.image_path, b.is_active, b.created_at, t.title, t.description \
         FROM books b LEFT JOIN book_translations t ON t.book_id = b.id AND t.locale = ? \
         WHERE b.is_active = 1 ORDER BY b.id LIMIT ? OFFSET ?",
    )
    .bind(locale)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows.into_iter().map(BookSummary::from).collect(), total as u64))
}

pub async fn find_by_id(executor: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn find_by_sku(executor: impl SqliteExecutor<'_>, sku: &str) -> RepoResult<Option<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE sku = ?");
    let row = sqlx::query_as::<_, Book>(&sql)
        .bind(sku)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn translations(
    executor: impl SqliteExecutor<'_>,
    book_id: i64,
) -> RepoResult<Vec<Translation>> {
    let rows = sqlx::query_as::<_, Translation>(
        "SELECT locale, title, description FROM book_translations WHERE book_id = ? ORDER BY locale",
    )
    .bind(book_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Title in `locale`, else English, else `None`
pub async fn localized_title(
    executor: impl SqliteExecutor<'_>,
    book_id: i64,
    locale: &str,
) -> RepoResult<Option<String>> {
    let title = sqlx::query_scalar::<_, String>(
        "SELECT title FROM book_translations WHERE book_id = ?1 AND locale IN (?2, 'en') \
         ORDER BY CASE locale WHEN ?2 THEN 0 ELSE 1 END LIMIT 1",
    )
    .bind(book_id)
    .bind(locale)
    .fetch_optional(executor)
    .await?;
    Ok(title)
}

/// Book with every translation, active or not
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<BookDetail>> {
    let Some(book) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let translations = translations(pool, id)
        .await?
        .into_iter()
        .map(|t| {
            (
                t.locale,
                TranslationText {
                    title: t.title,
                    description: t.description,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    Ok(Some(BookDetail {
        id: book.id,
        price: book.price(),
        in_stock: book.stock_quantity > 0,
        sku: book.sku,
        stock_quantity: book.stock_quantity,
        image_path: book.image_path,
        is_active: book.is_active,
        translations,
        created_at: book.created_at,
        updated_at: book.updated_at,
    }))
}

pub async fn create(conn: &mut SqliteConnection, data: &NewBook<'_>) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO books (sku, price_cents, stock_quantity, image_path, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(data.sku)
    .bind(data.price_cents)
    .bind(data.stock_quantity)
    .bind(data.image_path)
    .bind(data.is_active)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(conn: &mut SqliteConnection, id: i64, changes: &BookChanges<'_>) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE books SET sku = COALESCE(?1, sku), price_cents = COALESCE(?2, price_cents), \
         stock_quantity = COALESCE(?3, stock_quantity), image_path = COALESCE(?4, image_path), \
         is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7",
    )
    .bind(changes.sku)
    .bind(changes.price_cents)
    .bind(changes.stock_quantity)
    .bind(changes.image_path)
    .bind(changes.is_active)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Book {id}")));
    }
    Ok(())
}

/// Insert or replace the translation for `(book_id, locale)`
pub async fn upsert_translation(
    conn: &mut SqliteConnection,
    book_id: i64,
    locale: &str,
    title: &str,
    description: Option<&str>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO book_translations (book_id, locale, title, description) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (book_id, locale) DO UPDATE SET title = excluded.title, description = excluded.description",
    )
    .bind(book_id)
    .bind(locale)
    .bind(title)
    .bind(description)
    .execute(conn)
    .await?;
    Ok(())
}

/// Update only the description of an existing translation
pub async fn set_translation_description(
    conn: &mut SqliteConnection,
    book_id: i64,
    locale: &str,
    description: &str,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE book_translations SET description = ? WHERE book_id = ? AND locale = ?",
    )
    .bind(description)
    .bind(book_id)
    .bind(locale)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Hide a book from the catalog. Order items keep referencing it.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE books SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Conditional decrement: succeeds only while stock covers `quantity`.
/// Returns `false` when no row was changed.
pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE books SET stock_quantity = stock_quantity - ?1, updated_at = ?2 \
         WHERE id = ?3 AND stock_quantity >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn increment_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE books SET stock_quantity = stock_quantity + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Book {id}")));
    }
    Ok(())
}

/// Current stock, for checks outside a transaction
pub async fn stock_of(executor: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<i64>> {
    let stock = sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(stock)
}
