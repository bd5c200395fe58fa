//! The turn orchestrator.
//!
//! One turn is a single logical flow: validate the input, resolve a
//! transcript, generate a reply, render it to speech, persist the exchange.
//! The failure policy is positional — anything that fails *before* a reply
//! exists aborts the turn, anything after is absorbed so the caller still
//! receives the reply:
//!
//! - invalid input: rejected before any provider is called
//! - transcription failure: fatal, nothing persisted
//! - reasoning failure: never visible here — the engine returns a canned
//!   user-safe reply instead of an error
//! - synthesis failure: captured as detail, turn continues text-only
//! - persistence failure: logged, response still returned
//!
//! The provider calls and the store writes are not transactional with each
//! other; a delivered reply always wins over all-or-nothing consistency.

use crate::AppState;
use haven_identity::User;
use haven_sessions::{append_message, find_or_create_active_session, NewMessage};
use haven_types::{Role, Voice};
use thiserror::Error;

/// Media type of synthesized reply audio.
pub const SYNTHESIS_MEDIA_TYPE: &str = "audio/mpeg";

/// An uploaded audio blob with its declared media type and filename.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Input to one turn. Audio and text may both be present — audio takes
/// precedence — but at least one is required.
#[derive(Debug, Default)]
pub struct TurnInput {
    pub audio: Option<AudioUpload>,
    pub text: Option<String>,
    pub voice_override: Option<Voice>,
}

/// Result of a successfully processed turn.
///
/// `audio` is absent when synthesis failed; `synthesis_error` then carries
/// the failure detail for the fallback payload.
#[derive(Debug)]
pub struct TurnOutcome {
    pub transcript: String,
    pub reply_text: String,
    pub voice_used: Voice,
    pub audio: Option<Vec<u8>>,
    pub synthesis_error: Option<String>,
}

/// Errors that abort a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("transcription failed: {0}")]
    Transcription(String),
}

/// Processes one turn end to end.
///
/// `caller` is the resolved identity, if any; anonymous turns are never
/// persisted.
pub async fn process_turn(
    state: &AppState,
    caller: Option<&User>,
    input: TurnInput,
) -> Result<TurnOutcome, TurnError> {
    let audio_in = input.audio.as_ref().filter(|a| !a.bytes.is_empty());
    let text_in = input
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if audio_in.is_none() && text_in.is_none() {
        return Err(TurnError::InvalidInput(
            "Please provide either audio file or text input".to_string(),
        ));
    }

    // Audio wins when both are present.
    let transcript = match audio_in {
        Some(audio) => {
            tracing::debug!(
                filename = %audio.filename,
                bytes = audio.bytes.len(),
                "transcribing uploaded audio"
            );
            state
                .stt
                .transcribe(&audio.filename, &audio.media_type, &audio.bytes)
                .await
                .map_err(|e| TurnError::Transcription(e.to_string()))?
        }
        None => text_in.unwrap_or_default().to_string(),
    };

    // Explicit override, then the caller's stored preference, then the
    // system default.
    let voice_used = input
        .voice_override
        .or_else(|| caller.map(|u| u.voice_preference))
        .unwrap_or(Voice::SYSTEM_DEFAULT);

    // Turns are reasoned independently; no history is forwarded. The engine
    // is infallible by contract.
    let reply_text = state.reason.generate(&transcript, &[]).await;

    let (reply_audio, synthesis_error) = match state.tts.synthesize(&reply_text, voice_used).await {
        Ok(bytes) => (Some(bytes), None),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis failed, continuing with text-only reply");
            (None, Some(e.to_string()))
        }
    };

    if let Some(user) = caller {
        persist_turn(
            state,
            user.id,
            &transcript,
            input.audio.filter(|a| !a.bytes.is_empty()),
            &reply_text,
            voice_used,
            reply_audio.clone(),
        )
        .await;
    }

    Ok(TurnOutcome {
        transcript,
        reply_text,
        voice_used,
        audio: reply_audio,
        synthesis_error,
    })
}

/// Writes both sides of the exchange to the caller's active session.
///
/// Failures are logged and swallowed: the reply has already been produced,
/// and a store hiccup must not take it away from the caller.
async fn persist_turn(
    state: &AppState,
    user_id: i64,
    transcript: &str,
    input_audio: Option<AudioUpload>,
    reply_text: &str,
    voice_used: Voice,
    reply_audio: Option<Vec<u8>>,
) {
    let pool = state.pool.clone();
    let transcript = transcript.to_string();
    let reply_text = reply_text.to_string();

    let result = tokio::task::spawn_blocking(move || -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let session = find_or_create_active_session(&conn, user_id).map_err(|e| e.to_string())?;

        append_message(
            &conn,
            session.id,
            Role::User,
            &NewMessage {
                user_id: Some(user_id),
                text: transcript,
                audio: input_audio.as_ref().map(|a| a.bytes.clone()),
                audio_media_type: input_audio.map(|a| a.media_type),
                voice_used: None,
            },
        )
        .map_err(|e| e.to_string())?;

        let reply_media_type = reply_audio
            .as_ref()
            .map(|_| SYNTHESIS_MEDIA_TYPE.to_string());
        append_message(
            &conn,
            session.id,
            Role::Assistant,
            &NewMessage {
                user_id: Some(user_id),
                text: reply_text,
                audio: reply_audio,
                audio_media_type: reply_media_type,
                voice_used: Some(voice_used),
            },
        )
        .map_err(|e| e.to_string())?;

        Ok(())
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(detail)) => {
            tracing::error!(user_id, error = %detail, "failed to persist turn");
        }
        Err(join_err) => {
            tracing::error!(user_id, error = %join_err, "persistence task panicked");
        }
    }
}
