//! Authentication routes

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// - /api/auth/login, /api/auth/register: public
/// - everything else: authenticated by the global `require_auth` layer
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/logout", post(handler::logout))
        .route("/api/auth/user", get(handler::me))
        .route("/api/profile", get(handler::me))
}
