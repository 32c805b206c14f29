//! Language profile of an inquiry
//!
//! Inquiries arrive in English, Devanagari Hindi, romanized Hindi, or a
//! Hinglish mixture of the two. The profile is derived once per message and
//! is read-only afterwards.

use serde::{Deserialize, Serialize};

/// Dominant language/script of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryLanguage {
    #[default]
    English,
    HindiDevanagari,
    HindiRomanized,
    Hinglish,
}

impl PrimaryLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::HindiDevanagari => "hindi_devanagari",
            Self::HindiRomanized => "hindi_romanized",
            Self::Hinglish => "hinglish",
        }
    }

    /// Whether Hindi vocabulary is expected in the text
    pub fn uses_hindi(&self) -> bool {
        !matches!(self, Self::English)
    }
}

impl std::fmt::Display for PrimaryLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script of a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Devanagari,
    Latin,
    Other,
}

impl Script {
    pub fn of(c: char) -> Self {
        match c {
            '\u{0900}'..='\u{097F}' => Self::Devanagari,
            c if c.is_ascii_alphabetic() => Self::Latin,
            '\u{00C0}'..='\u{024F}' => Self::Latin,
            _ => Self::Other,
        }
    }
}

/// Result of language identification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub primary_language: PrimaryLanguage,
    /// Fraction of tokens not in the primary language
    pub mixture_ratio: f32,
    pub confidence: f32,
}

impl LanguageProfile {
    pub fn new(primary_language: PrimaryLanguage, mixture_ratio: f32, confidence: f32) -> Self {
        Self {
            primary_language,
            mixture_ratio: mixture_ratio.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Profile for text with nothing to classify
    pub fn undetermined() -> Self {
        Self::new(PrimaryLanguage::English, 0.0, 0.0)
    }
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self::undetermined()
    }
}
