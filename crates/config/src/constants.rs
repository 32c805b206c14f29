//! Default values for tunable thresholds
//!
//! Every value here can be overridden through [`crate::Settings`]; the
//! constants only seed the defaults.

/// Language identification thresholds (token ratios)
pub mod language {
    /// Devanagari token ratio at or above which text is Hindi (Devanagari)
    pub const DEVANAGARI_HIGH: f32 = 0.5;

    /// Devanagari token ratio below which text counts as Latin-only
    pub const DEVANAGARI_LOW: f32 = 0.1;

    /// Romanized Hindi ratio (of Latin tokens) that makes Latin text Hinglish
    pub const ROMANIZED_HINGLISH_MIN: f32 = 0.15;

    /// Romanized Hindi ratio at which Latin text is romanized Hindi
    pub const ROMANIZED_HIGH: f32 = 0.75;
}

/// Pattern matcher tier confidences
pub mod tiers {
    pub const EXACT: f32 = 0.95;
    pub const FUZZY: f32 = 0.8;
    pub const INFERRED: f32 = 0.5;

    /// Traveler count assumed for an unnumbered family
    pub const FAMILY_DEFAULT_SIZE: u32 = 4;
}

/// Statistical extractor defaults
pub mod statistical {
    pub const ENDPOINT: &str = "http://localhost:11434";
    pub const MODEL: &str = "qwen2.5:7b";
    pub const TIMEOUT_MS: u64 = 8_000;
    pub const CONFIDENCE_FLOOR: f32 = 0.5;
    pub const MAX_RETRIES: u32 = 2;
    pub const INITIAL_BACKOFF_MS: u64 = 200;
}

/// Fusion defaults
pub mod fusion {
    /// Multiplier applied when both sources agree
    pub const AGREEMENT_BONUS: f32 = 1.1;

    /// Statistical confidence must beat pattern confidence by more than this
    /// to override a structured field
    pub const DISAGREEMENT_MARGIN: f32 = 0.2;
}

/// Validation defaults
pub mod validation {
    pub const MAX_TRAVELERS: u32 = 50;
    pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.6;
}
