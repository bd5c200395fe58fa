//! Speech synthesis adapter.

use crate::config::TtsConfig;
use crate::error::VoiceError;
use haven_types::Voice;
use serde::Serialize;
use std::time::Duration;

/// Maximum text input size for synthesis (64 KiB). Prevents resource
/// exhaustion from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for one synthesis request.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    /// Canonical capitalize-first-letter voice name; the provider rejects
    /// lowercase variants.
    voice: &'a str,
}

/// Client for a JSON-in, audio-out synthesis endpoint.
///
/// The provider streams the audio body; the full stream is drained and
/// concatenated before returning, because callers need the complete blob.
#[derive(Debug, Clone)]
pub struct TtsClient {
    config: TtsConfig,
    http: reqwest::Client,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TTS_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Renders `text` to audio bytes in the given voice.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Synthesis` on oversized input, transport
    /// failure, or a non-success upstream status. The upstream error body
    /// is carried along — parsed as JSON when possible, raw text otherwise.
    pub async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let payload = SynthesisRequest {
            text,
            voice: voice.as_str(),
        };

        tracing::debug!(voice = voice.as_str(), text_len = text.len(), "requesting synthesis");

        let mut response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(parsed) => parsed.to_string(),
                Err(_) => body,
            };
            return Err(VoiceError::Synthesis(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let mut audio = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("stream read failed: {e}")))?
        {
            audio.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_text_rejected_locally() {
        let client = TtsClient::new(TtsConfig {
            api_url: "http://192.0.2.1/api/v1/tts".to_string(),
            ..Default::default()
        });

        let oversized = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = client
            .synthesize(&oversized, Voice::Tayo)
            .await
            .expect_err("must fail");

        match err {
            VoiceError::Synthesis(msg) => assert!(msg.contains("maximum size")),
            other => panic!("expected Synthesis error, got {other:?}"),
        }
    }
}
