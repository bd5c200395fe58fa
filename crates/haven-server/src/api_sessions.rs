//! Session history endpoint.

use crate::api::ApiError;
use crate::middleware::UserContext;
use crate::AppState;
use axum::extract::{Extension, Json};
use haven_sessions::{list_sessions, Session};
use std::sync::Arc;

/// How many recent sessions the history endpoint returns.
const SESSION_HISTORY_LIMIT: u32 = 10;

/// Handler for `GET /api/sessions`. Returns the caller's sessions,
/// newest-first, capped at [`SESSION_HISTORY_LIMIT`].
pub async fn list_sessions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(user)): Extension<UserContext>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let pool = state.pool.clone();
    let sessions = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        list_sessions(&conn, user.id, SESSION_HISTORY_LIMIT)
            .map_err(|e| ApiError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(sessions))
}
