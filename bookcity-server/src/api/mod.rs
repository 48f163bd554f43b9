//! API routes
//!
//! - [`health`] - liveness and database check
//! - [`auth`] - register, login, logout, current user
//! - [`books`] - localized catalog and admin maintenance
//! - [`orders`] - checkout, order history and status management

pub mod auth;
pub mod books;
mod extract;
pub mod health;
pub mod orders;

pub use crate::utils::{AppError, AppResult};
pub use extract::Json;
