//! Provider configuration.
//!
//! Each adapter takes its own config section. API keys are secrets and are
//! redacted from `Debug` output so they never land in logs.

use serde::Deserialize;
use std::fmt;

fn default_stt_url() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

/// Speech-to-text provider settings.
#[derive(Clone, Deserialize)]
pub struct SttConfig {
    /// Transcription endpoint URL.
    #[serde(default = "default_stt_url")]
    pub api_url: String,
    /// Bearer credential for the provider.
    #[serde(default)]
    pub api_key: String,
    /// Transcription model identifier.
    #[serde(default = "default_stt_model")]
    pub model: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_url: default_stt_url(),
            api_key: String::new(),
            model: default_stt_model(),
        }
    }
}

impl fmt::Debug for SttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SttConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

fn default_tts_url() -> String {
    "https://yarngpt.ai/api/v1/tts".to_string()
}

/// Speech synthesis provider settings.
#[derive(Clone, Deserialize)]
pub struct TtsConfig {
    /// Synthesis endpoint URL.
    #[serde(default = "default_tts_url")]
    pub api_url: String,
    /// Bearer credential for the provider.
    #[serde(default)]
    pub api_key: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_url: default_tts_url(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

fn default_reason_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_reason_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    1_800
}

fn default_max_retries() -> u32 {
    2
}

/// Reasoning provider settings.
///
/// The timeout is intentionally generous: replies are conversational, not
/// latency-critical, and a slow reply beats a dropped one.
#[derive(Clone, Deserialize)]
pub struct ReasonConfig {
    /// Chat completion endpoint URL.
    #[serde(default = "default_reason_url")]
    pub api_url: String,
    /// Bearer credential for the provider.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier.
    #[serde(default = "default_reason_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Reply length cap in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How many times a failed call is retried before falling back.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ReasonConfig {
    fn default() -> Self {
        Self {
            api_url: default_reason_url(),
            api_key: String::new(),
            model: default_reason_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl fmt::Debug for ReasonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
