use thiserror::Error;

/// Errors raised by the provider adapters.
///
/// The reasoning engine never surfaces errors to callers, so there is no
/// variant for it; its failures are absorbed into canned fallback replies.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// Speech-to-text failed. Fatal to the turn.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Speech synthesis failed. Non-fatal; the turn degrades to text-only.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Invalid adapter configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
