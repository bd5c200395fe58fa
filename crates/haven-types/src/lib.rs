//! Shared types and constants for the Haven platform.
//!
//! This crate provides the foundational vocabulary used across all Haven
//! crates: message roles and the synthesis voice catalogue. No crate in the
//! workspace depends on anything *except* `haven-types` for cross-cutting
//! type definitions, which keeps the dependency graph clean.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod voice;
pub use voice::{Voice, VoiceParseError};

/// The role of a message within a conversation session.
///
/// Exactly one of the two roles is attached to every persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An utterance from the human caller.
    User,
    /// A reply produced by the reasoning engine.
    Assistant,
}

impl Role {
    /// Returns the string label stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Attempts to convert a stored label back to a `Role`.
    pub fn from_str_label(s: &str) -> Result<Self, RoleParseError> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// Error returned when a stored role label is not recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown message role: {0}")]
pub struct RoleParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(Role::from_str_label(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn role_invalid_label() {
        assert!(Role::from_str_label("system").is_err());
        assert!(Role::from_str_label("").is_err());
    }
}
