//! User Repository

use shared::models::User;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

/// User row including the password hash (never leaves the server)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: i64,
}

impl From<UserCredentials> for User {
    fn from(row: UserCredentials) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

/// Lookup by email, case-insensitive
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<UserCredentials>> {
    let row = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, name, email, password_hash, is_admin, created_at FROM users WHERE lower(email) = lower(?)",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, name, email, is_admin, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert a user. A taken email surfaces as [`RepoError::Duplicate`].
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, is_admin, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(is_admin)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}
