//! Bulk catalog import (CSV, XLSX, XLS)
//!
//! Every row is parsed and validated before anything is written. A valid file
//! is applied in one transaction: unknown SKUs create books, known SKUs keep
//! their price and stock while their translations are upserted. Spreadsheets
//! are read from their first worksheet and go through the same row checks as
//! CSV.

use std::collections::HashMap;
use std::io::Cursor;
use std::str::FromStr;

use calamine::Reader;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{ImportSummary, LOCALE_EN, LOCALE_TA};
use sqlx::SqlitePool;
use thiserror::Error;

use super::validate_price;
use crate::db::repository::{RepoError, book};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN};

/// Upload size limit
pub const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

const REQUIRED_COLUMNS: [&str; 3] = ["sku", "price", "title_en"];

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Detect from the file extension, falling back to the content type
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let by_name = file_name
            .and_then(|n| n.rsplit_once('.'))
            .and_then(|(_, ext)| match ext.to_ascii_lowercase().as_str() {
                "csv" => Some(FileFormat::Csv),
                "xlsx" => Some(FileFormat::Xlsx),
                "xls" => Some(FileFormat::Xls),
                _ => None,
            });
        by_name.or_else(|| {
            let t = content_type?.to_ascii_lowercase();
            let mime = t.split(';').next().unwrap_or_default().trim();
            match mime {
                "text/csv" | "application/csv" => Some(FileFormat::Csv),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                    Some(FileFormat::Xlsx)
                }
                "application/vnd.ms-excel" => Some(FileFormat::Xls),
                _ => None,
            }
        })
    }
}

/// A problem with one data row (1-based, header is row 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

/// Import errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("File contains no data rows")]
    Empty,

    #[error("{} row(s) failed validation", .0.len())]
    InvalidRows(Vec<RowError>),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Repo(RepoError::from(err))
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Csv(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, format!("Malformed CSV: {e}"))
            }
            ImportError::Spreadsheet(e) => AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Unreadable spreadsheet: {e}"),
            ),
            ImportError::NoWorksheet => {
                AppError::with_message(ErrorCode::InvalidFormat, "Spreadsheet has no worksheet")
            }
            ImportError::MissingColumn(column) => AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Missing required column: {column}"),
            )
            .with_detail("column", column),
            ImportError::Empty => {
                AppError::with_message(ErrorCode::InvalidFormat, "File contains no data rows")
            }
            ImportError::InvalidRows(rows) => {
                let message = format!("{} row(s) failed validation", rows.len());
                AppError::with_message(ErrorCode::ImportRowsInvalid, message)
                    .with_detail("errors", serde_json::to_value(rows).unwrap_or_default())
            }
            ImportError::Repo(e) => e.into(),
        }
    }
}

/// One validated row
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub sku: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub title_en: String,
    pub title_ta: Option<String>,
    pub description_en: Option<String>,
    pub description_ta: Option<String>,
}

/// Header name → column index, tolerant of case, spacing and a UTF-8 BOM
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new<'h>(headers: impl IntoIterator<Item = &'h str>) -> Self {
        let map = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase(), i))
            .collect();
        Self(map)
    }

    fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Non-empty trimmed cell
    fn get<'r>(&self, record: &'r [String], name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&i| record.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn check_len(errors: &mut Vec<RowError>, row: usize, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value
        && v.chars().count() > max
    {
        errors.push(RowError {
            row,
            field: field.to_string(),
            message: format!("{field} is too long (max {max} chars)"),
        });
    }
}

fn parse_row(
    columns: &Columns,
    record: &[String],
    row: usize,
    errors: &mut Vec<RowError>,
) -> Option<ImportRow> {
    let before = errors.len();
    let mut fail = |field: &str, message: &str| {
        errors.push(RowError {
            row,
            field: field.to_string(),
            message: message.to_string(),
        })
    };

    let sku = columns.get(record, "sku");
    if sku.is_none() {
        fail("sku", "sku is required");
    }

    let price_cents = match columns.get(record, "price").map(Decimal::from_str) {
        None => {
            fail("price", "price is required");
            None
        }
        Some(Err(_)) => {
            fail("price", "price must be a number");
            None
        }
        Some(Ok(price)) => match validate_price(price, "price") {
            Ok(cents) => Some(cents),
            Err(e) => {
                fail("price", &e.message);
                None
            }
        },
    };

    // Either header name is accepted; missing stock means zero
    let stock_raw = columns
        .get(record, "stock")
        .or_else(|| columns.get(record, "stock_quantity"));
    let stock_quantity = match stock_raw.map(i64::from_str) {
        None => Some(0),
        Some(Ok(stock)) if stock >= 0 => Some(stock),
        Some(_) => {
            fail("stock", "stock must be a whole number of zero or more");
            None
        }
    };

    let is_active = match columns.get(record, "is_active") {
        None => Some(true),
        Some(raw) => {
            let parsed = parse_bool(raw);
            if parsed.is_none() {
                fail("is_active", "is_active must be true/false or 1/0");
            }
            parsed
        }
    };

    let title_en = columns.get(record, "title_en");
    if title_en.is_none() {
        fail("title_en", "title_en is required");
    }

    let image_path = columns.get(record, "image_path");
    let title_ta = columns.get(record, "title_ta");
    let description_en = columns.get(record, "description_en");
    let description_ta = columns.get(record, "description_ta");

    check_len(errors, row, "sku", sku, MAX_SHORT_TEXT_LEN);
    check_len(errors, row, "title_en", title_en, MAX_NAME_LEN);
    check_len(errors, row, "title_ta", title_ta, MAX_NAME_LEN);
    check_len(errors, row, "description_en", description_en, MAX_NOTE_LEN);
    check_len(errors, row, "description_ta", description_ta, MAX_NOTE_LEN);
    check_len(errors, row, "image_path", image_path, MAX_URL_LEN);

    if errors.len() > before {
        return None;
    }
    Some(ImportRow {
        sku: sku?.to_string(),
        price_cents: price_cents?,
        stock_quantity: stock_quantity?,
        image_path: image_path.map(str::to_string),
        is_active: is_active?,
        title_en: title_en?.to_string(),
        title_ta: title_ta.map(str::to_string),
        description_en: description_en.map(str::to_string),
        description_ta: description_ta.map(str::to_string),
    })
}

/// Validate a header plus data rows. Returns every row error at once.
fn parse_table(
    headers: Vec<String>,
    records: impl IntoIterator<Item = Vec<String>>,
) -> Result<Vec<ImportRow>, ImportError> {
    let columns = Columns::new(headers.iter().map(String::as_str));
    if let Some(missing) = REQUIRED_COLUMNS.into_iter().find(|c| !columns.has(c)) {
        return Err(ImportError::MissingColumn(missing));
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (index, record) in records.into_iter().enumerate() {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row_number = index + 2;
        if let Some(row) = parse_row(&columns, &record, row_number, &mut errors) {
            if let Some(first) = seen.insert(row.sku.clone(), row_number) {
                errors.push(RowError {
                    row: row_number,
                    field: "sku".to_string(),
                    message: format!("duplicate sku, first seen on row {first}"),
                });
                continue;
            }
            rows.push(row);
        }
    }

    if !errors.is_empty() {
        return Err(ImportError::InvalidRows(errors));
    }
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

pub fn parse_csv(data: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let records = reader
        .records()
        .map(|r| r.map(|record| record.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;
    parse_table(headers, records)
}

/// First worksheet of an XLSX or XLS workbook
pub fn parse_spreadsheet(data: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoWorksheet)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
    let headers = rows.next().ok_or(ImportError::Empty)?;
    parse_table(headers, rows)
}

pub fn parse_file(data: &[u8], format: FileFormat) -> Result<Vec<ImportRow>, ImportError> {
    match format {
        FileFormat::Csv => parse_csv(data),
        FileFormat::Xlsx | FileFormat::Xls => parse_spreadsheet(data),
    }
}

/// Validate then apply an uploaded file in one transaction
pub async fn import_file(
    pool: &SqlitePool,
    data: &[u8],
    format: FileFormat,
) -> Result<ImportSummary, ImportError> {
    let rows = parse_file(data, format)?;

    let mut summary = ImportSummary {
        rows: rows.len(),
        created: 0,
        updated: 0,
    };

    let mut tx = pool.begin().await?;
    for row in &rows {
        let book_id = match book::find_by_sku(&mut *tx, &row.sku).await? {
            Some(existing) => {
                summary.updated += 1;
                existing.id
            }
            None => {
                summary.created += 1;
                book::create(
                    &mut tx,
                    &book::NewBook {
                        sku: &row.sku,
                        price_cents: row.price_cents,
                        stock_quantity: row.stock_quantity,
                        image_path: row.image_path.as_deref(),
                        is_active: row.is_active,
                    },
                )
                .await?
            }
        };

        book::upsert_translation(&mut tx, book_id, LOCALE_EN, &row.title_en, row.description_en.as_deref())
            .await?;
        if let Some(title_ta) = &row.title_ta {
            book::upsert_translation(&mut tx, book_id, LOCALE_TA, title_ta, row.description_ta.as_deref())
                .await?;
        }
    }
    tx.commit().await?;

    tracing::info!(
        format = ?format,
        rows = summary.rows,
        created = summary.created,
        updated = summary.updated,
        "Catalog file imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    const HEADER: &str = "sku,price,stock,image_path,is_active,title_en,title_ta,description_en,description_ta\n";

    #[test]
    fn test_parse_valid_file() {
        let csv = format!(
            "{HEADER}TB-001,120.00,5,covers/tb1.jpg,1,Thirukkural,திருக்குறள்,Couplets,குறள்கள்\n\
             TB-002,80,,,,Silappatikaram,,,\n"
        );
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price_cents, 12_000);
        assert_eq!(rows[0].title_ta.as_deref(), Some("திருக்குறள்"));
        assert_eq!(rows[1].stock_quantity, 0);
        assert!(rows[1].is_active);
        assert_eq!(rows[1].title_ta, None);
    }

    #[test]
    fn test_stock_quantity_header_and_bom() {
        let csv = "\u{feff}SKU,Price,Stock_Quantity,Title_EN\nTB-001,1.50,7,Kural\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].stock_quantity, 7);
        assert_eq!(rows[0].price_cents, 150);
    }

    #[test]
    fn test_all_row_errors_reported() {
        let csv = format!(
            "{HEADER},12.00,1,,,Missing sku,,,\n\
             TB-002,-3,1,,,Negative price,,,\n\
             TB-003,5.00,two,,,Bad stock,,,\n\
             TB-004,5.00,1,,maybe,,,,\n"
        );
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        let ImportError::InvalidRows(errors) = err else {
            panic!("expected row errors, got {err:?}");
        };
        let fields: Vec<(usize, &str)> = errors.iter().map(|e| (e.row, e.field.as_str())).collect();
        assert_eq!(
            fields,
            vec![
                (2, "sku"),
                (3, "price"),
                (4, "stock"),
                (5, "is_active"),
                (5, "title_en"),
            ]
        );
    }

    #[test]
    fn test_missing_column_and_empty_file() {
        assert!(matches!(
            parse_csv(b"sku,title_en\nTB-1,Kural\n"),
            Err(ImportError::MissingColumn("price"))
        ));
        assert!(matches!(parse_csv(HEADER.as_bytes()), Err(ImportError::Empty)));
    }

    #[test]
    fn test_duplicate_sku_in_file() {
        let csv = "sku,price,title_en\nTB-1,1,A\nTB-1,2,B\n";
        let ImportError::InvalidRows(errors) = parse_csv(csv.as_bytes()).unwrap_err() else {
            panic!("expected row errors");
        };
        assert_eq!(errors[0].row, 3);
    }

    #[test]
    fn test_row_errors_map_to_app_error() {
        let err: AppError = ImportError::InvalidRows(vec![RowError {
            row: 2,
            field: "sku".into(),
            message: "sku is required".into(),
        }])
        .into();
        assert_eq!(err.code, ErrorCode::ImportRowsInvalid);
        let details = err.details.unwrap();
        assert_eq!(details["errors"][0]["row"], 2);
    }

    enum Cell {
        Text(&'static str),
        Number(f64),
    }

    fn workbook(rows: &[Vec<Cell>]) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(v) => sheet.write(r as u32, c as u16, *v).unwrap(),
                    Cell::Number(v) => sheet.write(r as u32, c as u16, *v).unwrap(),
                };
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(FileFormat::detect(Some("books.csv"), None), Some(FileFormat::Csv));
        assert_eq!(
            FileFormat::detect(Some("BOOKS.XLSX"), Some("application/octet-stream")),
            Some(FileFormat::Xlsx)
        );
        assert_eq!(FileFormat::detect(Some("old.xls"), None), Some(FileFormat::Xls));
        assert_eq!(
            FileFormat::detect(None, Some("text/csv; charset=utf-8")),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            FileFormat::detect(None, Some("application/vnd.ms-excel")),
            Some(FileFormat::Xls)
        );
        assert_eq!(FileFormat::detect(Some("books.pdf"), Some("application/pdf")), None);
        assert_eq!(FileFormat::detect(None, None), None);
    }

    #[test]
    fn test_parse_xlsx_uses_row_checks() {
        use Cell::{Number, Text};
        let data = workbook(&[
            vec![Text("sku"), Text("price"), Text("stock"), Text("title_en"), Text("title_ta")],
            vec![Text("TB-001"), Number(120.0), Number(5.0), Text("Thirukkural"), Text("திருக்குறள்")],
            vec![Text("TB-002"), Number(45.5), Number(0.0), Text("Naladiyar"), Text("")],
        ]);
        let rows = parse_file(&data, FileFormat::Xlsx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price_cents, 12_000);
        assert_eq!(rows[0].stock_quantity, 5);
        assert_eq!(rows[0].title_ta.as_deref(), Some("திருக்குறள்"));
        assert_eq!(rows[1].price_cents, 4_550);
        assert_eq!(rows[1].title_ta, None);

        let bad = workbook(&[
            vec![Text("sku"), Text("price"), Text("title_en")],
            vec![Text("TB-003"), Text("free"), Text("Kural")],
        ]);
        let ImportError::InvalidRows(errors) = parse_file(&bad, FileFormat::Xlsx).unwrap_err() else {
            panic!("expected row errors");
        };
        assert_eq!((errors[0].row, errors[0].field.as_str()), (2, "price"));
    }

    #[test]
    fn test_garbage_spreadsheet_is_invalid_format() {
        let err: AppError = parse_file(b"not a workbook", FileFormat::Xlsx).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn test_import_xlsx_writes_books() {
        use Cell::{Number, Text};
        let pool = memory_pool().await.unwrap();
        let data = workbook(&[
            vec![Text("sku"), Text("price"), Text("stock_quantity"), Text("title_en")],
            vec![Text("XL-001"), Number(99.0), Number(3.0), Text("Kuruntokai")],
        ]);
        let summary = import_file(&pool, &data, FileFormat::Xlsx).await.unwrap();
        assert_eq!(summary.created, 1);

        let created = book::find_by_sku(&pool, "XL-001").await.unwrap().unwrap();
        assert_eq!(created.price_cents, 9_900);
        assert_eq!(created.stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_import_creates_then_keeps_price_and_stock() {
        let pool = memory_pool().await.unwrap();
        let first = format!("{HEADER}TB-001,120.00,5,,1,Thirukkural,,,\n");
        let summary = import_file(&pool, first.as_bytes(), FileFormat::Csv).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                rows: 1,
                created: 1,
                updated: 0
            }
        );

        let second = format!(
            "{HEADER}TB-001,999.00,50,,1,Thirukkural (2nd ed.),திருக்குறள்,,\nTB-002,10,1,,0,Naladiyar,,,\n"
        );
        let summary = import_file(&pool, second.as_bytes(), FileFormat::Csv).await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);

        let existing = book::find_by_sku(&pool, "TB-001").await.unwrap().unwrap();
        assert_eq!(existing.price_cents, 12_000);
        assert_eq!(existing.stock_quantity, 5);
        let detail = book::find_detail(&pool, existing.id).await.unwrap().unwrap();
        assert_eq!(detail.translations["en"].title, "Thirukkural (2nd ed.)");
        assert_eq!(detail.translations["ta"].title, "திருக்குறள்");

        let inactive = book::find_by_sku(&pool, "TB-002").await.unwrap().unwrap();
        assert!(!inactive.is_active);
    }

    #[tokio::test]
    async fn test_invalid_file_writes_nothing() {
        let pool = memory_pool().await.unwrap();
        let csv = format!("{HEADER}TB-001,120.00,5,,1,Thirukkural,,,\nTB-002,abc,1,,,Bad,,,\n");
        assert!(import_file(&pool, csv.as_bytes(), FileFormat::Csv).await.is_err());
        assert!(book::find_by_sku(&pool, "TB-001").await.unwrap().is_none());
    }
}
