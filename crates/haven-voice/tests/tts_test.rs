//! Synthesis adapter behavior against a local stand-in provider.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::{routing::post, Json, Router};
use haven_types::Voice;
use haven_voice::{TtsClient, TtsConfig, VoiceError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api/v1/tts")
}

#[tokio::test]
async fn returns_complete_audio_and_canonical_voice_name() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();

    let router = Router::new()
        .route(
            "/api/v1/tts",
            post(
                |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *seen.lock().unwrap() = Some(body);
                    (
                        StatusCode::OK,
                        [(header::CONTENT_TYPE, "audio/mpeg")],
                        vec![0x49u8, 0x44, 0x33, 0x04, 0x00, 0x00],
                    )
                },
            ),
        )
        .with_state(seen.clone());

    let client = TtsClient::new(TtsConfig {
        api_url: serve(router).await,
        api_key: "test-key".to_string(),
    });

    let audio = client
        .synthesize("Take two slow breaths.", Voice::Emma)
        .await
        .expect("synthesis succeeds");

    assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04, 0x00, 0x00]);

    let body = seen.lock().unwrap().take().expect("request captured");
    assert_eq!(body["voice"], "Emma", "wire form is capitalized");
    assert_eq!(body["text"], "Take two slow breaths.");
}

#[tokio::test]
async fn structured_error_body_is_carried_in_detail() {
    let router = Router::new().route(
        "/api/v1/tts",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "voice pool exhausted"})),
            )
        }),
    );

    let client = TtsClient::new(TtsConfig {
        api_url: serve(router).await,
        ..Default::default()
    });

    let err = client
        .synthesize("hello", Voice::Tayo)
        .await
        .expect_err("must fail");

    match err {
        VoiceError::Synthesis(msg) => {
            assert!(msg.contains("503"), "missing status in: {msg}");
            assert!(msg.contains("voice pool exhausted"), "missing detail in: {msg}");
        }
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn raw_text_error_body_is_carried_in_detail() {
    let router = Router::new().route(
        "/api/v1/tts",
        post(|| async { (StatusCode::BAD_REQUEST, "no such voice") }),
    );

    let client = TtsClient::new(TtsConfig {
        api_url: serve(router).await,
        ..Default::default()
    });

    let err = client
        .synthesize("hello", Voice::Tayo)
        .await
        .expect_err("must fail");

    match err {
        VoiceError::Synthesis(msg) => assert!(msg.contains("no such voice")),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}
