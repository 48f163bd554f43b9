//! BookCity server - bilingual (English/Tamil) bookstore backend
//!
//! # Module layout
//!
//! ```text
//! bookcity-server/src/
//! ├── core/          # config, state, server loop
//! ├── auth/          # JWT, Argon2, middleware
//! ├── db/            # SQLite pool, migrations, repositories
//! ├── catalog/       # localized catalog queries, CSV import
//! ├── orders/        # checkout and status transitions
//! ├── api/           # HTTP routes and handlers
//! ├── services/      # router assembly
//! └── utils/         # logging, validation, error re-exports
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod db;
pub mod orders;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use services::http::build_router;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, then initialize logging from `LOG_LEVEL` / `LOG_DIR`
pub fn setup_environment() -> Result<(), AppError> {
    // Missing .env is fine; variables may come from the process environment
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    let json = std::env::var("LOG_JSON").ok().map(|v| v == "true" || v == "1");
    init_logger_with_file(log_level.as_deref(), json, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
    ____              __   _______ __
   / __ )____  ____  / /__/ ____(_) /___  __
  / __  / __ \/ __ \/ //_/ /   / / __/ / / /
 / /_/ / /_/ / /_/ / ,< / /___/ / /_/ /_/ /
/_____/\____/\____/_/|_|\____/_/\__/\__, /
                                   /____/
    "#
    );
}
