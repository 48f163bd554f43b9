use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{JwtService, password};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::user;
use crate::utils::AppError;

/// Server state - shared handles passed to every handler
///
/// Cloning is cheap: the pool and JWT service are reference counted.
///
/// | Field | Type | Meaning |
/// |-------|------|---------|
/// | config | Config | Immutable configuration |
/// | pool | SqlitePool | Database connection pool |
/// | jwt_service | Arc<JwtService> | Token issue / validation |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Build state from parts (tests use this with an in-memory pool)
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            pool,
            jwt_service,
        }
    }

    /// Open the database, run migrations and seed the admin account
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_url).await?;
        let state = Self::new(config.clone(), db.pool);

        if let Some(seed) = &config.admin_seed {
            state.seed_admin(&seed.name, &seed.email, &seed.password).await?;
        } else if config.is_development() {
            tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, no admin account seeded");
        }

        Ok(state)
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    async fn seed_admin(&self, name: &str, email: &str, plain: &str) -> Result<(), AppError> {
        if user::find_by_email(&self.pool, email).await?.is_some() {
            tracing::debug!(email = %email, "Admin account already present");
            return Ok(());
        }
        let hash = password::hash_password(plain)?;
        let admin = user::create(&self.pool, name, email, &hash, true).await?;
        tracing::info!(user_id = admin.id, email = %email, "Seeded admin account");
        Ok(())
    }
}
