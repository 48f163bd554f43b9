//! Core module - configuration, shared state and the server loop
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - state handed to every handler
//! - [`Server`] - HTTP listener

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
