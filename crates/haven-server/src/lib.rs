//! Haven server library logic.
//!
//! Assembles the HTTP surface over the turn orchestrator, the identity and
//! session stores, and the three provider adapters. Adapter clients are
//! long-lived and shared across concurrent turns.

pub mod api;
pub mod api_auth;
pub mod api_profile;
pub mod api_sessions;
pub mod api_turn;
pub mod config;
pub mod middleware;
pub mod turn;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use haven_db::DbPool;
use haven_voice::{ReasonClient, SttClient, TtsClient};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Speech-to-text adapter.
    pub stt: Arc<SttClient>,
    /// Speech synthesis adapter.
    pub tts: Arc<TtsClient>,
    /// Conversational reasoning adapter.
    pub reason: Arc<ReasonClient>,
}

/// Maximum request body size for regular API routes (2 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum request body size for turn submissions (12 MiB) — audio uploads
/// up to the transcription adapter's 10 MiB cap, plus multipart overhead.
const MAX_TURN_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(api_auth::me_handler))
        .route(
            "/api/profile",
            get(api_profile::get_profile_handler).patch(api_profile::update_profile_handler),
        )
        .route("/api/sessions", get(api_sessions::list_sessions_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    // The turn route carries audio uploads and needs a larger body limit.
    // Identity is optional here, so no auth middleware — the handler
    // resolves the caller itself and tolerates anonymity.
    let turn_routes = Router::new()
        .route("/api/voice_input", post(api_turn::turn_handler))
        .layer(DefaultBodyLimit::max(MAX_TURN_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(api_auth::register_handler))
        .route("/api/auth/login", post(api_auth::login_handler))
        .merge(protected_routes)
        .merge(turn_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
