//! Registration, login, and current-identity endpoint tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use haven_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use haven_server::{app, AppState};
use haven_voice::{ReasonClient, ReasonConfig, SttClient, SttConfig, TtsClient, TtsConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Providers are never reached by these tests; the adapters point at a
/// reserved address.
fn setup_app() -> (Router, DbPool) {
    // A single pooled connection: every pooled connection to ":memory:"
    // would otherwise open its own private database.
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        },
    )
    .unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();

    let state = AppState {
        pool: pool.clone(),
        stt: Arc::new(SttClient::new(SttConfig {
            api_url: "http://192.0.2.1/stt".to_string(),
            ..Default::default()
        })),
        tts: Arc::new(TtsClient::new(TtsConfig {
            api_url: "http://192.0.2.1/tts".to_string(),
            api_key: String::new(),
        })),
        reason: Arc::new(ReasonClient::new(ReasonConfig {
            api_url: "http://192.0.2.1/chat".to_string(),
            ..Default::default()
        })),
    };

    (app(state), pool)
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn register_issues_token_and_derived_handle() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(json_post(
            "/api/auth/register",
            json!({"full_name": "Ada Obi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(!json["token"].as_str().unwrap().is_empty());
    assert_eq!(json["user"]["full_name"], "Ada Obi");
    assert_eq!(json["user"]["username"], "ada_obi");
    assert_eq!(json["user"]["voice_preference"], "Chinenye");
}

#[tokio::test]
async fn register_requires_display_name() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(json_post("/api/auth/register", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Full name is required");
}

#[tokio::test]
async fn duplicate_display_names_get_distinct_handles() {
    let (app, _pool) = setup_app();

    let first = body_json(
        app.clone()
            .oneshot(json_post(
                "/api/auth/register",
                json!({"full_name": "Ada Obi"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.clone()
            .oneshot(json_post(
                "/api/auth/register",
                json!({"full_name": "Ada Obi"}),
            ))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first["user"]["username"], "ada_obi");
    assert_eq!(second["user"]["username"], "ada_obi_2");
}

#[tokio::test]
async fn login_finds_registered_user() {
    let (app, _pool) = setup_app();

    let registered = body_json(
        app.clone()
            .oneshot(json_post(
                "/api/auth/register",
                json!({"full_name": "Tunde Bello"}),
            ))
            .await
            .unwrap(),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            json!({"full_name": "Tunde Bello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token"], registered["token"]);
    assert_eq!(json["user"]["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn login_unknown_name_is_not_found() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(json_post(
            "/api/auth/login",
            json!({"full_name": "Nobody Here"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "User not found. Please register first.");
}

#[tokio::test]
async fn me_requires_and_resolves_bearer_token() {
    let (app, _pool) = setup_app();

    let registered = body_json(
        app.clone()
            .oneshot(json_post(
                "/api/auth/register",
                json!({"full_name": "Chi Chi"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let token = registered["token"].as_str().unwrap();

    let unauthenticated = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], registered["user"]["id"]);
    assert_eq!(json["username"], "chi_chi");
}
