// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, TEACHER_ROLE},
    state::AppState,
    utils::{
        hash::{hash_password, password_matches},
        jwt::sign_jwt,
    },
};

/// Registers a new teacher account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .store
        .create_user(payload.username.trim(), &hashed_password, TEACHER_ROLE)
        .await?;

    tracing::info!("Registered teacher {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a teacher and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .store
        .find_user_by_username(payload.username.trim())
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

    if !password_matches(&payload.password, &user.password) {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "user": user,
    })))
}
