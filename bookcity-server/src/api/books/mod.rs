//! Book API Module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/books | GET | none |
//! | /api/books/{id} | GET | none |
//! | /api/books | POST | admin |
//! | /api/books/{id} | PUT, DELETE | admin |
//! | /api/books/upload | POST | admin (multipart `file`, CSV, max 5 MB) |

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::catalog::import::MAX_IMPORT_BYTES;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/books", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route(
            "/upload",
            // Headroom for multipart framing; the file itself is checked against the limit
            post(handler::upload).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES + 64 * 1024)),
        )
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
