//! Order API Module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/orders | POST | user (checkout) |
//! | /api/orders/my-orders | GET | user |
//! | /api/orders/{id} | GET | owner or admin |
//! | /api/orders | GET | admin |
//! | /api/orders/{id} | DELETE | admin (cancel) |
//! | /api/orders/{id}/status | PUT | admin |
//! | /api/orders/{id}/payment | PUT | admin |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // Any authenticated user (require_auth is global)
    let customer_routes = Router::new()
        .route("/", post(handler::place))
        .route("/my-orders", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_id));

    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", delete(handler::cancel))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/payment", put(handler::update_payment))
        .layer(middleware::from_fn(require_admin));

    customer_routes.merge(admin_routes)
}
