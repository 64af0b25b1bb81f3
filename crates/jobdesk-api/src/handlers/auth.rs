//! Auth handlers: registration, login and the current principal.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use jobdesk_models::{NewUser, PublicUser, Role};
use jobdesk_store::UserRepository;

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Fixed for the lifetime of the account.
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Token response for register and login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Register a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = hash_password(&payload.password)?;

    let users = UserRepository::new(state.store.clone());
    let user = users
        .create(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: payload.role,
            company: payload.company,
        })
        .await
        .map_err(|e| {
            if e.is_duplicate() {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                e.into()
            }
        })?;

    let token = state.keys.issue(&user.id, user.role)?;

    info!(user_id = %user.id, role = %user.role, "Registered user");

    Ok(Json(AuthResponse {
        token,
        user: user.to_public(),
    }))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let users = UserRepository::new(state.store.clone());

    // One uniform rejection: never reveal which of the two was wrong.
    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.keys.issue(&user.id, user.role)?;

    Ok(Json(AuthResponse {
        token,
        user: user.to_public(),
    }))
}

/// Return the authenticated principal's public profile.
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<PublicUser>> {
    let users = UserRepository::new(state.store.clone());
    let user = users
        .get(&principal.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    Ok(Json(user.to_public()))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
