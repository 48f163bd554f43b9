//! Data models
//!
//! Shared between the server and the client library (via the API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are UTC millis.

pub mod book;
pub mod order;
pub mod user;

// Re-exports
pub use book::*;
pub use order::*;
pub use user::*;
