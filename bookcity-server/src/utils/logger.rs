//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the level passed in (or `info`) is
//! applied to this crate and tower_http.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::utils::AppError;

/// Initialize the logger with defaults (stdout, info)
pub fn init_logger() -> Result<(), AppError> {
    init_logger_with_file(None, None, None)
}

/// Initialize the logger with optional JSON formatting and daily file output
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: Option<bool>,
    log_dir: Option<&str>,
) -> Result<(), AppError> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookcity_server={level},tower_http={level},http_access={level},security={level}")
            .into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    let result = match (log_dir, json.unwrap_or(false)) {
        (Some(dir), json) => {
            let path = Path::new(dir);
            std::fs::create_dir_all(path)
                .map_err(|e| AppError::internal(format!("Cannot create log dir {dir}: {e}")))?;
            let appender = tracing_appender::rolling::daily(path, "bookcity-server.log");
            if json {
                builder.json().with_writer(appender).try_init()
            } else {
                builder.with_ansi(false).with_writer(appender).try_init()
            }
        }
        (None, true) => builder.json().try_init(),
        (None, false) => builder.try_init(),
    };

    result.map_err(|e| AppError::internal(format!("Logger already initialized: {e}")))
}
