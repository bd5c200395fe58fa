//! The turn submission endpoint.
//!
//! `POST /api/voice_input` accepts either a multipart form (an `audio` file
//! plus optional `text` and `voice_preference` fields) or a JSON body
//! (`text`, optional `voice_preference`). The caller's bearer token is
//! optional — anonymous turns are processed but never persisted.
//!
//! When synthesis succeeds the reply audio is the response body, with the
//! transcript and reply text carried in side-channel headers. Header values
//! cannot hold arbitrary text (line breaks, control characters), so both
//! are base64-encoded and the `X-Encoding` header declares it; clients must
//! treat that marker as authoritative.

use crate::api::ApiError;
use crate::middleware::resolve_user;
use crate::turn::{self, AudioUpload, TurnError, TurnInput, TurnOutcome, SYNTHESIS_MEDIA_TYPE};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Extension, FromRequest, Multipart, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cap for JSON turn bodies; audio goes through multipart, so text bodies
/// stay small.
const MAX_TEXT_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct TextTurnRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    voice_preference: Option<String>,
}

/// Fallback body returned when synthesis is unavailable.
#[derive(Debug, Serialize)]
struct TurnFallbackResponse {
    user_query: String,
    transcript: String,
    response_text: String,
    audio_url: Option<String>,
    tts_error: Option<String>,
    message: &'static str,
}

/// Handler for `POST /api/voice_input`.
pub async fn turn_handler(
    Extension(state): Extension<Arc<AppState>>,
    req: Request,
) -> Result<Response, ApiError> {
    let caller = resolve_user(&state, req.headers()).await.map_err(|status| {
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized("invalid bearer token".to_string())
        } else {
            ApiError::Internal("identity lookup failed".to_string())
        }
    })?;

    let input = extract_turn_input(req).await?;

    let outcome = turn::process_turn(&state, caller.as_ref(), input)
        .await
        .map_err(|e| match e {
            TurnError::InvalidInput(msg) => ApiError::BadRequest(msg),
            TurnError::Transcription(detail) => ApiError::BadGateway(detail),
        })?;

    Ok(shape_response(outcome))
}

/// Pulls a [`TurnInput`] out of the request, branching on content type.
async fn extract_turn_input(req: Request) -> Result<TurnInput, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;

        let mut input = TurnInput::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart field: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "audio" => {
                    let filename = field.file_name().unwrap_or("audio").to_string();
                    let media_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {e}")))?
                        .to_vec();
                    input.audio = Some(AudioUpload {
                        filename,
                        media_type,
                        bytes,
                    });
                }
                "text" => {
                    input.text = Some(field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("failed to read text field: {e}"))
                    })?);
                }
                "voice_preference" => {
                    let raw = field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("failed to read voice field: {e}"))
                    })?;
                    input.voice_override = parse_voice_field(&raw)?;
                }
                _ => {}
            }
        }
        Ok(input)
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_TEXT_BODY_BYTES)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;

        if bytes.is_empty() {
            // Validation in the orchestrator produces the canonical message.
            return Ok(TurnInput::default());
        }

        let parsed: TextTurnRequest = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;

        Ok(TurnInput {
            audio: None,
            text: parsed.text,
            voice_override: parsed
                .voice_preference
                .as_deref()
                .map(parse_voice_field)
                .transpose()?
                .flatten(),
        })
    }
}

/// Parses a voice field, treating blank values as absent. Unknown names are
/// rejected up front — before any provider has been called.
fn parse_voice_field(raw: &str) -> Result<Option<haven_types::Voice>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e: haven_types::VoiceParseError| ApiError::BadRequest(e.to_string()))
}

/// Shapes the HTTP response for a completed turn.
fn shape_response(outcome: TurnOutcome) -> Response {
    match outcome.audio {
        Some(audio) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(SYNTHESIS_MEDIA_TYPE),
            );
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"response.mp3\""),
            );

            let encoded_transcript = BASE64.encode(outcome.transcript.as_bytes());
            let encoded_reply = BASE64.encode(outcome.reply_text.as_bytes());

            // Base64 output is always a valid header value.
            if let Ok(value) = HeaderValue::from_str(&encoded_transcript) {
                headers.insert("X-Transcript", value.clone());
                headers.insert("X-User-Query", value);
            }
            if let Ok(value) = HeaderValue::from_str(&encoded_reply) {
                headers.insert("X-Response-Text", value);
            }
            headers.insert("X-Encoding", HeaderValue::from_static("base64"));

            (StatusCode::OK, headers, Body::from(audio)).into_response()
        }
        None => Json(TurnFallbackResponse {
            user_query: outcome.transcript.clone(),
            transcript: outcome.transcript,
            response_text: outcome.reply_text,
            audio_url: None,
            tts_error: outcome.synthesis_error,
            message: "TTS service unavailable. Text response provided.",
        })
        .into_response(),
    }
}
