//! Profile endpoints: voice preference and consent flag.

use crate::api::ApiError;
use crate::middleware::UserContext;
use crate::AppState;
use axum::extract::{Extension, Json};
use haven_identity::{update_profile, ProfileUpdate, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub voice_preference: &'static str,
    pub consent: bool,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            voice_preference: user.voice_preference.as_str(),
            consent: user.consent,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub voice_preference: Option<String>,
    #[serde(default)]
    pub consent: Option<bool>,
}

/// Handler for `GET /api/profile`.
pub async fn get_profile_handler(
    Extension(UserContext(user)): Extension<UserContext>,
) -> Json<ProfileResponse> {
    Json(user.into())
}

/// Handler for `PATCH /api/profile`. Absent fields are left untouched.
pub async fn update_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(user)): Extension<UserContext>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let voice_preference = payload
        .voice_preference
        .as_deref()
        .map(|raw| {
            raw.parse::<haven_types::Voice>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let update = ProfileUpdate {
        voice_preference,
        consent: payload.consent,
    };

    let pool = state.pool.clone();
    let updated = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        update_profile(&conn, user.id, update).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(updated.into()))
}
