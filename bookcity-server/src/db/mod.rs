//! Database Module
//!
//! Handles the SQLite connection pool and migrations

pub mod repository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::utils::AppError;

/// Write conflicts wait this long instead of failing immediately
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database service - owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (creating if missing) the database at `url` with WAL and foreign keys,
    /// then apply migrations.
    pub async fn new(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::database(format!("Invalid database url: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(
            "Database connection established (SQLite WAL, busy_timeout={}ms)",
            BUSY_TIMEOUT.as_millis()
        );

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }
}

/// Apply embedded migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Single-connection in-memory database with migrations applied
///
/// An in-memory SQLite database lives as long as its connection, so the pool
/// is pinned to exactly one connection that never expires.
pub async fn memory_pool() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database(e.to_string()))?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
    run_migrations(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures for unit tests

    use sqlx::SqlitePool;

    use super::repository::{book, user};

    /// Insert an active book with an English title; returns its id
    pub async fn seed_book(pool: &SqlitePool, sku: &str, price_cents: i64, stock: i64) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        let id = book::create(
            &mut conn,
            &book::NewBook {
                sku,
                price_cents,
                stock_quantity: stock,
                image_path: None,
                is_active: true,
            },
        )
        .await
        .unwrap();
        book::upsert_translation(&mut conn, id, "en", &format!("{sku} title"), None)
            .await
            .unwrap();
        id
    }

    /// Insert a customer (or admin) account; returns its id
    pub async fn seed_user(pool: &SqlitePool, email: &str, is_admin: bool) -> i64 {
        user::create(pool, "Test User", email, "$argon2id$unused", is_admin)
            .await
            .unwrap()
            .id
    }

    pub async fn stock(pool: &SqlitePool, book_id: i64) -> i64 {
        book::stock_of(pool, book_id).await.unwrap().unwrap()
    }

    pub async fn order_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await
            .unwrap()
    }
}
