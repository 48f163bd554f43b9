//! Authentication Handlers
//!
//! Tokens are stateless; logout only records the event.

use std::time::Duration;

use axum::{extract::State, http::StatusCode};
use shared::client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use shared::error::{ApiResponse, ErrorCode};

use crate::AppError;
use crate::api::Json;
use crate::auth::{CurrentUser, password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, user};
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, validate_email, validate_required_text,
};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn issue(state: &ServerState, user: shared::models::User) -> Result<LoginResponse, AppError> {
    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.name, &user.email, user.is_admin)?;
    Ok(LoginResponse {
        token,
        user: UserInfo::from(user),
    })
}

/// POST /api/auth/register - create a customer account and log it in
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_email(&req.email, "email")?;
    let password_len = req.password.chars().count();
    if password_len < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        )
        .with_detail("field", "password"));
    }
    if password_len > MAX_PASSWORD_LEN {
        return Err(AppError::field(
            "password",
            format!("password is too long (max {MAX_PASSWORD_LEN} chars)"),
        ));
    }

    let email_taken = || {
        AppError::with_message(ErrorCode::EmailAlreadyRegistered, "Email is already registered")
            .with_detail("field", "email")
    };
    if user::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(email_taken());
    }

    let hash = password::hash_password(&req.password)?;
    let created = user::create(&state.pool, &req.name, &req.email, &hash, false)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => email_taken(),
            other => other.into(),
        })?;

    tracing::info!(user_id = created.id, email = %created.email, "User registered");
    Ok((StatusCode::CREATED, Json(issue(&state, created)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let found = user::find_by_email(&state.pool, &req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent account enumeration
    let credentials = match found {
        Some(c) if password::verify_password(&req.password, &c.password_hash)? => c,
        Some(_) => {
            security_log!("WARN", "login_failed", email = req.email.clone(), reason = "invalid_password");
            return Err(AppError::with_message(ErrorCode::InvalidCredentials, INVALID_CREDENTIALS));
        }
        None => {
            security_log!("WARN", "login_failed", email = req.email.clone(), reason = "user_not_found");
            return Err(AppError::with_message(ErrorCode::InvalidCredentials, INVALID_CREDENTIALS));
        }
    };

    let user: shared::models::User = credentials.into();
    tracing::info!(user_id = user.id, email = %user.email, is_admin = user.is_admin, "User logged in");
    Ok(Json(issue(&state, user)?))
}

/// GET /api/auth/user, GET /api/profile
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<UserInfo>, AppError> {
    // Fresh from the database so a removed account is not served from the token
    let user = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(AppError::unauthorized)?;
    Ok(Json(UserInfo::from(user)))
}

/// POST /api/auth/logout
pub async fn logout(current: CurrentUser) -> Json<ApiResponse<()>> {
    tracing::info!(user_id = current.id, email = %current.email, "User logged out");
    Json(ApiResponse::ok("Logged out successfully"))
}
