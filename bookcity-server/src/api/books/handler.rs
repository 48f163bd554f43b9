//! Book API Handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{BookCreate, BookDetail, BookQuery, BookSummary, BookUpdate, ImportSummary};
use shared::pagination::Paginated;

use crate::api::Json;
use crate::catalog::{self, FileFormat, import::MAX_IMPORT_BYTES};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/books?lang=ta&page=2&per_page=20
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Paginated<BookSummary>>> {
    let page = catalog::list_books(&state.pool, &query).await?;
    Ok(Json(page))
}

/// GET /api/books/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDetail>> {
    let book = catalog::get_book(&state.pool, id).await?;
    Ok(Json(book))
}

/// POST /api/books
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BookCreate>,
) -> AppResult<(StatusCode, Json<BookDetail>)> {
    let book = catalog::create_book(&state.pool, payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /api/books/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookUpdate>,
) -> AppResult<Json<BookDetail>> {
    let book = catalog::update_book(&state.pool, id, payload).await?;
    Ok(Json(book))
}

/// DELETE /api/books/{id} - deactivates, never removes
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    catalog::delete_book(&state.pool, id).await?;
    Ok(Json(ApiResponse::ok("Book deleted successfully")))
}

/// POST /api/books/upload (multipart, field `file`: .csv, .xlsx or .xls)
pub async fn upload(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let mut upload: Option<(Vec<u8>, FileFormat)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_request(format!("Failed to read multipart field: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let format = FileFormat::detect(field.file_name(), field.content_type()).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::UnsupportedFileType,
                "Only CSV, XLSX and XLS files are supported",
            )
        })?;

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::invalid_request(format!("Failed to read file: {e}")))?
        {
            if buf.len() + chunk.len() > MAX_IMPORT_BYTES {
                return Err(AppError::with_message(
                    ErrorCode::FileTooLarge,
                    format!("File exceeds the {} MB limit", MAX_IMPORT_BYTES / (1024 * 1024)),
                ));
            }
            buf.extend_from_slice(&chunk);
        }
        upload = Some((buf, format));
        break;
    }

    let (data, format) = upload.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    let summary = catalog::import_file(&state.pool, &data, format).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Books imported successfully!",
        summary,
    )))
}
