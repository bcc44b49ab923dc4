//! Registration, login, and current-user routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use lectern_shared::{UserRecord, new_id};

use crate::auth::{AuthUser, hash_password, issue_token, verify_password};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Login payload. The frontend posts the email in `username`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// `POST /register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if body.full_name.trim().is_empty() || body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("full_name and email are required".into()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    if state.storage.find_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let user = UserRecord {
        id: new_id(),
        full_name: body.full_name.trim().to_string(),
        email: body.email.trim().to_string(),
        password_hash: hash_password(&body.password)?,
        created_at: Utc::now(),
    };

    // The unique email constraint backs the pre-check under concurrency.
    state.storage.insert_user(&user).await?;

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
        }),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .storage
        .find_user_by_email(&body.username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let access_token = issue_token(
        &state.jwt_secret,
        &user.id,
        &user.email,
        state.token_ttl_hours,
    )?;

    info!(user_id = %user.id, "user logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// `GET /me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .storage
        .get_user(&auth.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse {
        id: user.id,
        full_name: user.full_name,
        email: user.email,
    }))
}
