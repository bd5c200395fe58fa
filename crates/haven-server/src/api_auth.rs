//! Registration, login, and current-identity endpoints.
//!
//! Registration needs nothing but a display name: a unique handle is
//! derived from it and an opaque bearer token is issued. Login is a lookup
//! by the same display name. There are no passwords.

use crate::api::ApiError;
use crate::middleware::UserContext;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use haven_identity::{login_user, register_user, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub voice_preference: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            voice_preference: user.voice_preference.as_str(),
        }
    }
}

/// Handler for `POST /api/auth/register`.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NameRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let pool = state.pool.clone();
    let (user, token) = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        register_user(&conn, &payload.full_name).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Handler for `POST /api/auth/login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NameRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let pool = state.pool.clone();
    let (user, token) = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        login_user(&conn, &payload.full_name).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Handler for `GET /api/auth/me`.
pub async fn me_handler(Extension(UserContext(user)): Extension<UserContext>) -> Json<AuthUser> {
    Json(user.into())
}
