//! The synthesis voice catalogue.
//!
//! Voices are an enumerated contract with the speech synthesis provider.
//! Parsing is case-insensitive; the canonical wire form is the
//! capitalize-first-letter name the provider expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named synthesis voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Idera,
    Emma,
    Zainab,
    Osagie,
    Wura,
    Jude,
    Chinenye,
    Tayo,
    Regina,
    Femi,
    Adaora,
    Umar,
    Mary,
    Nonso,
    Remi,
    Adam,
}

/// Error returned when a voice name is not in the catalogue.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown voice: {0}")]
pub struct VoiceParseError(pub String);

impl Voice {
    /// Every voice in the catalogue.
    pub const ALL: [Voice; 16] = [
        Voice::Idera,
        Voice::Emma,
        Voice::Zainab,
        Voice::Osagie,
        Voice::Wura,
        Voice::Jude,
        Voice::Chinenye,
        Voice::Tayo,
        Voice::Regina,
        Voice::Femi,
        Voice::Adaora,
        Voice::Umar,
        Voice::Mary,
        Voice::Nonso,
        Voice::Remi,
        Voice::Adam,
    ];

    /// The voice used when the caller has no identity and no override.
    pub const SYSTEM_DEFAULT: Voice = Voice::Tayo;

    /// Returns the canonical (capitalized) name sent to the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idera => "Idera",
            Self::Emma => "Emma",
            Self::Zainab => "Zainab",
            Self::Osagie => "Osagie",
            Self::Wura => "Wura",
            Self::Jude => "Jude",
            Self::Chinenye => "Chinenye",
            Self::Tayo => "Tayo",
            Self::Regina => "Regina",
            Self::Femi => "Femi",
            Self::Adaora => "Adaora",
            Self::Umar => "Umar",
            Self::Mary => "Mary",
            Self::Nonso => "Nonso",
            Self::Remi => "Remi",
            Self::Adam => "Adam",
        }
    }

    /// Returns a short human-readable description of the voice character.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idera => "Idera - Melodic, gentle",
            Self::Emma => "Emma - Authoritative, deep",
            Self::Zainab => "Zainab - Soothing, gentle",
            Self::Osagie => "Osagie - Smooth, calm",
            Self::Wura => "Wura - Young, sweet",
            Self::Jude => "Jude - Warm, confident",
            Self::Chinenye => "Chinenye - Engaging, warm",
            Self::Tayo => "Tayo - Upbeat, energetic",
            Self::Regina => "Regina - Mature, warm",
            Self::Femi => "Femi - Rich, reassuring",
            Self::Adaora => "Adaora - Warm, engaging",
            Self::Umar => "Umar - Calm, smooth",
            Self::Mary => "Mary - Energetic, youthful",
            Self::Nonso => "Nonso - Bold, resonant",
            Self::Remi => "Remi - Melodious, warm",
            Self::Adam => "Adam - Deep, clear",
        }
    }
}

/// Newly registered users start with this voice until they pick another.
impl Default for Voice {
    fn default() -> Self {
        Voice::Chinenye
    }
}

impl FromStr for Voice {
    type Err = VoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Voice::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| VoiceParseError(trimmed.to_string()))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("tayo".parse::<Voice>(), Ok(Voice::Tayo));
        assert_eq!("TAYO".parse::<Voice>(), Ok(Voice::Tayo));
        assert_eq!("Emma".parse::<Voice>(), Ok(Voice::Emma));
        assert_eq!(" idera ".parse::<Voice>(), Ok(Voice::Idera));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(
            "siri".parse::<Voice>(),
            Err(VoiceParseError("siri".to_string()))
        );
        assert!("".parse::<Voice>().is_err());
    }

    #[test]
    fn canonical_names_round_trip() {
        for voice in Voice::ALL {
            assert_eq!(voice.as_str().parse::<Voice>(), Ok(voice));
        }
    }

    #[test]
    fn wire_form_is_capitalized() {
        for voice in Voice::ALL {
            let name = voice.as_str();
            assert!(name.chars().next().unwrap().is_ascii_uppercase());
            assert!(name.chars().skip(1).all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(Voice::default(), Voice::Chinenye);
        assert_eq!(Voice::SYSTEM_DEFAULT, Voice::Tayo);
    }

    #[test]
    fn labels_lead_with_name() {
        for voice in Voice::ALL {
            assert!(voice.label().starts_with(voice.as_str()));
        }
    }
}
