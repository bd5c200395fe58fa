//! Provider adapters for the Haven relay.
//!
//! Wraps the three external capability providers the relay depends on:
//! speech-to-text transcription, conversational reasoning, and speech
//! synthesis. Each adapter holds one long-lived HTTP client, built once at
//! construction and shared across concurrent turns.
//!
//! Failure policy differs per adapter and is part of the contract:
//! transcription failures are fatal to a turn, synthesis failures degrade
//! the turn to text-only, and the reasoning engine never fails — residual
//! provider errors come back as canned user-safe replies.

pub mod config;
pub mod directive;
pub mod error;
pub mod reason;
pub mod stt;
pub mod tts;

pub use config::{ReasonConfig, SttConfig, TtsConfig};
pub use error::VoiceError;
pub use reason::{ChatTurn, ReasonClient};
pub use stt::SttClient;
pub use tts::TtsClient;
