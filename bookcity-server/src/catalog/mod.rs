//! Catalog
//!
//! Localized listings, book detail and admin maintenance. Bulk CSV and
//! spreadsheet import lives in [`import`].

pub mod import;

use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    BookCreate, BookDetail, BookQuery, BookSummary, BookUpdate, LOCALE_EN, LOCALE_TA,
    SUPPORTED_LOCALES,
};
use shared::money::{is_valid_price, to_minor_units};
use shared::pagination::{PageRequest, Paginated};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, book};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, normalize_optional,
    validate_optional_text, validate_required_text,
};

pub use import::{FileFormat, ImportError, import_file};

/// Listing page size when the caller does not ask for one
pub const DEFAULT_PER_PAGE: u32 = 15;

/// `lang` if supported, else English
pub fn resolve_locale(lang: Option<&str>) -> &'static str {
    let requested = lang.map(str::trim).unwrap_or(LOCALE_EN);
    SUPPORTED_LOCALES
        .into_iter()
        .find(|l| l.eq_ignore_ascii_case(requested))
        .unwrap_or(LOCALE_EN)
}

pub(crate) fn book_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::BookNotFound, format!("Book {id} not found"))
}

fn sku_exists(sku: &str) -> AppError {
    AppError::with_message(ErrorCode::SkuExists, format!("SKU already exists: {sku}"))
        .with_detail("field", "sku")
}

pub(crate) fn validate_price(price: Decimal, field: &str) -> AppResult<i64> {
    if !is_valid_price(price) {
        return Err(AppError::with_message(
            ErrorCode::InvalidPrice,
            "Price must be non-negative with at most 2 decimal places",
        )
        .with_detail("field", field.to_string()));
    }
    to_minor_units(price).ok_or_else(|| {
        AppError::with_message(ErrorCode::ValueOutOfRange, "Price is out of range")
            .with_detail("field", field.to_string())
    })
}

pub(crate) fn validate_stock(stock: i64, field: &str) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::field(field, "Stock quantity must be zero or more"));
    }
    Ok(())
}

/// Active books in `lang`, oldest first
pub async fn list_books(pool: &SqlitePool, query: &BookQuery) -> AppResult<Paginated<BookSummary>> {
    let locale = resolve_locale(query.lang.as_deref());
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE);
    let (books, total) = book::list_active(pool, locale, page).await?;
    Ok(Paginated::new(books, total, page.page, page.per_page))
}

/// Any book, active or not, with all translations
pub async fn get_book(pool: &SqlitePool, id: i64) -> AppResult<BookDetail> {
    book::find_detail(pool, id)
        .await?
        .ok_or_else(|| book_not_found(id))
}

pub async fn create_book(pool: &SqlitePool, data: BookCreate) -> AppResult<BookDetail> {
    validate_required_text(&data.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    let price_cents = validate_price(data.price, "price")?;
    validate_stock(data.stock_quantity, "stock_quantity")?;
    validate_optional_text(&data.image_path, "image_path", MAX_URL_LEN)?;
    validate_required_text(&data.title_en, "title_en", MAX_NAME_LEN)?;
    validate_optional_text(&data.title_ta, "title_ta", MAX_NAME_LEN)?;
    validate_optional_text(&data.description_en, "description_en", MAX_NOTE_LEN)?;
    validate_optional_text(&data.description_ta, "description_ta", MAX_NOTE_LEN)?;

    let sku = data.sku.trim();
    let image_path = normalize_optional(data.image_path);
    let description_en = normalize_optional(data.description_en);
    let description_ta = normalize_optional(data.description_ta);

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    let id = book::create(
        &mut tx,
        &book::NewBook {
            sku,
            price_cents,
            stock_quantity: data.stock_quantity,
            image_path: image_path.as_deref(),
            is_active: data.is_active.unwrap_or(true),
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => sku_exists(sku),
        other => other.into(),
    })?;

    book::upsert_translation(&mut tx, id, LOCALE_EN, data.title_en.trim(), description_en.as_deref()).await?;
    if let Some(title_ta) = normalize_optional(data.title_ta) {
        book::upsert_translation(&mut tx, id, LOCALE_TA, &title_ta, description_ta.as_deref()).await?;
    }
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(book_id = id, sku = %sku, "Book created");
    get_book(pool, id).await
}

/// Partial update. A title in a locale upserts that translation; a
/// description without a title only updates an existing translation.
pub async fn update_book(pool: &SqlitePool, id: i64, data: BookUpdate) -> AppResult<BookDetail> {
    if let Some(sku) = &data.sku {
        validate_required_text(sku, "sku", MAX_SHORT_TEXT_LEN)?;
    }
    let price_cents = data.price.map(|p| validate_price(p, "price")).transpose()?;
    if let Some(stock) = data.stock_quantity {
        validate_stock(stock, "stock_quantity")?;
    }
    validate_optional_text(&data.image_path, "image_path", MAX_URL_LEN)?;
    if let Some(title) = &data.title_en {
        validate_required_text(title, "title_en", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.title_ta, "title_ta", MAX_NAME_LEN)?;
    validate_optional_text(&data.description_en, "description_en", MAX_NOTE_LEN)?;
    validate_optional_text(&data.description_ta, "description_ta", MAX_NOTE_LEN)?;

    let sku = data.sku.as_deref().map(str::trim);
    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    book::update(
        &mut tx,
        id,
        &book::BookChanges {
            sku,
            price_cents,
            stock_quantity: data.stock_quantity,
            image_path: data.image_path.as_deref(),
            is_active: data.is_active,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => book_not_found(id),
        RepoError::Duplicate(_) => sku_exists(sku.unwrap_or_default()),
        other => other.into(),
    })?;

    for (locale, title, description) in [
        (LOCALE_EN, data.title_en, data.description_en),
        (LOCALE_TA, data.title_ta, data.description_ta),
    ] {
        let description = normalize_optional(description);
        match normalize_optional(title) {
            Some(title) => {
                book::upsert_translation(&mut tx, id, locale, &title, description.as_deref()).await?
            }
            None => {
                if let Some(description) = description {
                    book::set_translation_description(&mut tx, id, locale, &description).await?;
                }
            }
        }
    }
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(book_id = id, "Book updated");
    get_book(pool, id).await
}

/// Hide a book from listings. Existing orders keep their items.
pub async fn delete_book(pool: &SqlitePool, id: i64) -> AppResult<()> {
    if book::deactivate(pool, id).await? {
        tracing::info!(book_id = id, "Book deactivated");
        return Ok(());
    }
    // Already inactive is fine; a missing book is not
    match book::find_by_id(pool, id).await? {
        Some(_) => Ok(()),
        None => Err(book_not_found(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use std::str::FromStr;

    fn create_payload(sku: &str) -> BookCreate {
        BookCreate {
            sku: sku.into(),
            price: Decimal::from_str("349.00").unwrap(),
            stock_quantity: 12,
            image_path: Some("books/ponniyin.jpg".into()),
            is_active: None,
            title_en: "Ponniyin Selvan".into(),
            title_ta: Some("பொன்னியின் செல்வன்".into()),
            description_en: Some("Historical novel".into()),
            description_ta: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_book() {
        let pool = memory_pool().await.unwrap();
        let created = create_book(&pool, create_payload("PS-001")).await.unwrap();

        assert_eq!(created.sku, "PS-001");
        assert_eq!(created.price, Decimal::from_str("349.00").unwrap());
        assert!(created.is_active);
        assert!(created.in_stock);
        assert_eq!(created.translations.len(), 2);
        assert_eq!(created.title_for("ta"), "பொன்னியின் செல்வன்");
        assert_eq!(
            created.translations["en"].description.as_deref(),
            Some("Historical novel")
        );

        let err = create_book(&pool, create_payload("PS-001")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SkuExists);

        let err = get_book(&pool, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BookNotFound);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = memory_pool().await.unwrap();

        let mut payload = create_payload("PS-002");
        payload.price = Decimal::from_str("-1").unwrap();
        assert_eq!(create_book(&pool, payload).await.unwrap_err().code, ErrorCode::InvalidPrice);

        let mut payload = create_payload("PS-002");
        payload.title_en = " ".into();
        assert_eq!(create_book(&pool, payload).await.unwrap_err().code, ErrorCode::ValidationFailed);

        let mut payload = create_payload("PS-002");
        payload.stock_quantity = -3;
        assert!(create_book(&pool, payload).await.is_err());
    }

    #[tokio::test]
    async fn test_listing_is_localized_and_skips_inactive() {
        let pool = memory_pool().await.unwrap();
        let first = create_book(&pool, create_payload("PS-001")).await.unwrap();
        let mut english_only = create_payload("EN-001");
        english_only.title_en = "Only English".into();
        english_only.title_ta = None;
        english_only.stock_quantity = 0;
        create_book(&pool, english_only).await.unwrap();
        let hidden = create_book(&pool, create_payload("HID-001")).await.unwrap();
        delete_book(&pool, hidden.id).await.unwrap();

        let query = BookQuery {
            lang: Some("ta".into()),
            ..Default::default()
        };
        let page = list_books(&pool, &query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.per_page, DEFAULT_PER_PAGE);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.data[0].id, first.id);
        assert_eq!(page.data[0].title, "பொன்னியின் செல்வன்");
        assert_eq!(page.data[1].title, "Title not available");
        assert!(!page.data[1].in_stock);

        let page = list_books(&pool, &BookQuery::default()).await.unwrap();
        assert_eq!(page.data[1].title, "Only English");
    }

    #[tokio::test]
    async fn test_pagination() {
        let pool = memory_pool().await.unwrap();
        for i in 0..5 {
            create_book(&pool, create_payload(&format!("SKU-{i}"))).await.unwrap();
        }
        let query = BookQuery {
            lang: None,
            page: Some(3),
            per_page: Some(2),
        };
        let page = list_books(&pool, &query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].sku, "SKU-4");
    }

    #[tokio::test]
    async fn test_update_book() {
        let pool = memory_pool().await.unwrap();
        let mut payload = create_payload("PS-001");
        payload.title_ta = None;
        let created = create_book(&pool, payload).await.unwrap();

        let updated = update_book(
            &pool,
            created.id,
            BookUpdate {
                price: Some(Decimal::from_str("299.50").unwrap()),
                title_ta: Some("பொன்னியின் செல்வன்".into()),
                description_en: Some("Revised blurb".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price, Decimal::from_str("299.50").unwrap());
        assert_eq!(updated.stock_quantity, 12);
        assert_eq!(updated.translations.len(), 2);
        assert_eq!(updated.translations["en"].title, "Ponniyin Selvan");
        assert_eq!(
            updated.translations["en"].description.as_deref(),
            Some("Revised blurb")
        );

        let err = update_book(&pool, 999, BookUpdate::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BookNotFound);
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_idempotent() {
        let pool = memory_pool().await.unwrap();
        let created = create_book(&pool, create_payload("PS-001")).await.unwrap();

        delete_book(&pool, created.id).await.unwrap();
        delete_book(&pool, created.id).await.unwrap();
        let detail = get_book(&pool, created.id).await.unwrap();
        assert!(!detail.is_active);

        assert_eq!(delete_book(&pool, 999).await.unwrap_err().code, ErrorCode::BookNotFound);
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale(None), "en");
        assert_eq!(resolve_locale(Some("TA")), "ta");
        assert_eq!(resolve_locale(Some("de")), "en");
    }
}
