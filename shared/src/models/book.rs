//! Book Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LOCALE_EN: &str = "en";
pub const LOCALE_TA: &str = "ta";

/// Locales the catalog carries translations for
pub const SUPPORTED_LOCALES: [&str; 2] = [LOCALE_EN, LOCALE_TA];

/// Shown in listings when a book has no translation in the requested locale
pub const TITLE_NOT_AVAILABLE: &str = "Title not available";

/// Localized text of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Translation {
    pub locale: String,
    pub title: String,
    pub description: Option<String>,
}

/// Catalog listing entry, projected into one locale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i64,
    pub sku: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    pub in_stock: bool,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Title/description pair keyed by locale in [`BookDetail`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationText {
    pub title: String,
    pub description: Option<String>,
}

/// Single book with every translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDetail {
    pub id: i64,
    pub sku: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    pub in_stock: bool,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub translations: BTreeMap<String, TranslationText>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BookDetail {
    /// Title in `locale`, falling back to English, then to the SKU
    pub fn title_for(&self, locale: &str) -> &str {
        self.translations
            .get(locale)
            .or_else(|| self.translations.get(LOCALE_EN))
            .map(|t| t.title.as_str())
            .unwrap_or(&self.sku)
    }
}

/// Create book payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub sku: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    pub image_path: Option<String>,
    pub is_active: Option<bool>,
    pub title_en: String,
    pub title_ta: Option<String>,
    pub description_en: Option<String>,
    pub description_ta: Option<String>,
}

/// Update book payload (absent fields are left unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i64>,
    pub image_path: Option<String>,
    pub is_active: Option<bool>,
    pub title_en: Option<String>,
    pub title_ta: Option<String>,
    pub description_en: Option<String>,
    pub description_ta: Option<String>,
}

/// Catalog list query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookQuery {
    pub lang: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Result of a bulk CSV import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
}
