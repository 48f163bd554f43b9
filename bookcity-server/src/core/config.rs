use std::str::FromStr;

use rust_decimal::Decimal;

use crate::auth::JwtConfig;
use crate::orders::Pricing;
use crate::utils::AppError;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_URL | sqlite:bookcity.db | SQLite database |
/// | HTTP_PORT | 8000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
/// | TAX_RATE | 0.05 | Flat tax rate applied to the subtotal |
/// | SHIPPING_COST | 0 | Flat shipping cost per order |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | unset | Seed an admin account on startup |
/// | ADMIN_NAME | Administrator | Display name of the seeded admin |
/// | JWT_SECRET, JWT_EXPIRATION_MINUTES, JWT_ISSUER, JWT_AUDIENCE | see [`JwtConfig`] | Token settings |
///
/// `LOG_LEVEL`, `LOG_DIR` and `LOG_JSON` are read by
/// [`setup_environment`](crate::setup_environment) before the config is built.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub request_timeout_ms: u64,
    pub jwt: JwtConfig,
    pub pricing: Pricing,
    pub admin_seed: Option<AdminSeed>,
}

/// Admin account created at startup when absent
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Fails on malformed money values and on a missing or short
    /// `JWT_SECRET` in production.
    pub fn from_env() -> Result<Self, AppError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        let pricing = Pricing {
            tax_rate: env_decimal("TAX_RATE")?.unwrap_or(shared::money::DEFAULT_TAX_RATE),
            shipping_cost: env_decimal("SHIPPING_COST")?.unwrap_or(Decimal::ZERO),
        };
        if pricing.tax_rate.is_sign_negative() || pricing.shipping_cost.is_sign_negative() {
            return Err(AppError::with_message(
                shared::error::ErrorCode::ConfigError,
                "TAX_RATE and SHIPPING_COST must be non-negative",
            ));
        }

        let admin_seed = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:bookcity.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            jwt: JwtConfig::from_env(is_production)?,
            pricing,
            admin_seed,
            environment,
        })
    }

    /// Configuration for tests: in-memory database, fixed secret
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            http_port: 0,
            environment: "test".into(),
            request_timeout_ms: 30000,
            jwt: JwtConfig::for_tests(),
            pricing: Pricing::default(),
            admin_seed: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn env_decimal(key: &str) -> Result<Option<Decimal>, AppError> {
    match std::env::var(key) {
        Ok(raw) => Decimal::from_str(raw.trim()).map(Some).map_err(|e| {
            AppError::with_message(
                shared::error::ErrorCode::ConfigError,
                format!("{key} is not a decimal number: {e}"),
            )
        }),
        Err(_) => Ok(None),
    }
}
