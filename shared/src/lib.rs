//! Shared types for BookCity
//!
//! Domain models, API payloads, the unified error system and money helpers
//! used by both the server and the client library.

pub mod client;
pub mod error;
pub mod models;
pub mod money;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use pagination::Paginated;
