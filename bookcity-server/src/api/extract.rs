//! Request extractors whose rejections use the API error envelope

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::AppError;

/// `axum::Json` with rejections reported as [`AppError`]
///
/// A missing or mistyped field becomes a 422 with `details.field` set to the
/// offending path (for example `cart[0].quantity`).
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
