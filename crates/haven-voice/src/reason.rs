//! Conversational reasoning engine.
//!
//! Wraps a chat-completions provider with the conversational directive, a
//! bounded retry count, and a generous timeout. The engine never raises to
//! its caller: whatever goes wrong upstream, [`ReasonClient::generate`]
//! returns a user-safe reply — either the provider's, or one of three
//! canned fallbacks selected by classifying the failure.

use crate::config::ReasonConfig;
use crate::directive::DIRECTIVE;
use haven_types::Role;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback reply for timeout-like failures.
pub const FALLBACK_TIMEOUT: &str =
    "I'm having trouble connecting right now. Could you please try again in a moment?";

/// Fallback reply for rate-limit-like failures.
pub const FALLBACK_RATE_LIMIT: &str =
    "I need a moment to catch my breath. Please try again shortly.";

/// Fallback reply for everything else.
pub const FALLBACK_GENERIC: &str =
    "I'm having a small technical difficulty. Could you please repeat that?";

/// Pause between retry attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// One prior utterance, for callers that forward conversation history.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Classifies a failure description into one of the canned fallback replies.
pub fn classify_failure(detail: &str) -> &'static str {
    let lower = detail.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        FALLBACK_TIMEOUT
    } else if lower.contains("rate limit") {
        FALLBACK_RATE_LIMIT
    } else {
        FALLBACK_GENERIC
    }
}

/// Client for the reasoning provider.
#[derive(Debug, Clone)]
pub struct ReasonClient {
    config: ReasonConfig,
    http: reqwest::Client,
}

impl ReasonClient {
    pub fn new(config: ReasonConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Produces a reply for the transcript. Infallible by contract: any
    /// residual provider failure is absorbed into a canned fallback.
    ///
    /// `history` is prior turns, oldest first. The current deployment passes
    /// an empty slice — each turn is reasoned independently — but the
    /// parameter keeps history forwarding open without an API break.
    pub async fn generate(&self, transcript: &str, history: &[ChatTurn]) -> String {
        match self.request_reply(transcript, history).await {
            Ok(reply) => reply,
            Err(detail) => {
                tracing::warn!(error = %detail, "reasoning provider failed, using fallback reply");
                classify_failure(&detail).to_string()
            }
        }
    }

    async fn request_reply(&self, transcript: &str, history: &[ChatTurn]) -> Result<String, String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: DIRECTIVE,
        });
        for turn in history {
            messages.push(ChatMessage {
                role: turn.role.as_str(),
                content: &turn.text,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: transcript,
        });

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut last_error = String::new();
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF).await;
                tracing::debug!(attempt, "retrying reasoning call");
            }
            match self.call_once(&request).await {
                Ok(reply) => return Ok(reply),
                Err(detail) => last_error = detail,
            }
        }
        Err(last_error)
    }

    async fn call_once(&self, request: &ChatRequest<'_>) -> Result<String, String> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    format!("request failed: {e}")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                Err(format!("rate limit exceeded (status 429): {body}"))
            } else {
                Err(format!("provider returned {status}: {body}"))
            };
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("unparseable response: {e}"))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| "provider returned no choices".to_string())
    }
}
