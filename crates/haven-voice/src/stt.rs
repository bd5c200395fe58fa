//! Speech-to-text transcription adapter.

use crate::config::SttConfig;
use crate::error::VoiceError;
use serde::Deserialize;
use std::time::Duration;

/// Maximum audio input size for transcription (10 MiB). Prevents OOM from
/// oversized payloads before anything reaches the wire.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for one transcription request.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for a Whisper-style transcription endpoint.
///
/// The audio is submitted as a multipart `file` part carrying the original
/// filename and media type. The caller keeps ownership of the audio bytes —
/// the orchestrator needs them again for persistence — so this adapter
/// borrows and copies only what the wire needs.
#[derive(Debug, Clone)]
pub struct SttClient {
    config: SttConfig,
    http: reqwest::Client,
}

impl SttClient {
    pub fn new(config: SttConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(STT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Transcribes an audio blob to text.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Transcription` on oversized input, transport
    /// failure, a non-success upstream status, or an unparseable response.
    /// No local retry is attempted.
    pub async fn transcribe(
        &self,
        filename: &str,
        media_type: &str,
        audio: &[u8],
    ) -> Result<String, VoiceError> {
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Transcription(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(media_type)
            .map_err(|e| {
                VoiceError::Transcription(format!("invalid audio media type '{media_type}': {e}"))
            })?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.config.model.clone())
            .part("file", part);

        tracing::debug!(
            filename,
            media_type,
            bytes = audio.len(),
            "submitting audio for transcription"
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Transcription(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "provider returned {status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(format!("unparseable response: {e}")))?;

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_audio_rejected_locally() {
        // An unroutable URL proves no request is made: a local rejection
        // returns immediately instead of timing out.
        let client = SttClient::new(SttConfig {
            api_url: "http://192.0.2.1/v1/audio/transcriptions".to_string(),
            ..Default::default()
        });

        let oversized = vec![0u8; MAX_STT_INPUT_BYTES + 1];
        let err = client
            .transcribe("clip.webm", "audio/webm", &oversized)
            .await
            .expect_err("must fail");

        match err {
            VoiceError::Transcription(msg) => assert!(msg.contains("maximum size")),
            other => panic!("expected Transcription error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_media_type_rejected_locally() {
        let client = SttClient::new(SttConfig {
            api_url: "http://192.0.2.1/v1/audio/transcriptions".to_string(),
            ..Default::default()
        });

        let err = client
            .transcribe("clip.webm", "not a mime type", &[1, 2, 3])
            .await
            .expect_err("must fail");

        match err {
            VoiceError::Transcription(msg) => assert!(msg.contains("media type")),
            other => panic!("expected Transcription error, got {other:?}"),
        }
    }
}
