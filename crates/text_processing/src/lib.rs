//! Text processing for travel inquiries
//!
//! This crate provides the deterministic front half of the engine:
//! - **Normalization**: encoding repair, quoted-reply and signature removal
//! - **Language identification**: English, Devanagari Hindi, romanized Hindi, Hinglish
//! - **Pattern extraction**: lexicon and regex rules per catalog field
//! - **Parsers**: Indian-convention money amounts, date ranges and trip lengths
//!
//! # Example
//!
//! ```ignore
//! use travel_inquiry_text_processing::{LanguageIdentifier, Normalizer, PatternExtractor};
//!
//! let text = Normalizer::new().normalize(&message);
//! let profile = LanguageIdentifier::new(&settings.language).identify(text.as_str());
//! let extractor = PatternExtractor::new(&settings.pattern, &settings.lexicon)?;
//! let fields = extractor.extract_fields(&text, &profile);
//! ```

pub mod dates;
pub mod language;
pub mod money;
pub mod normalizer;
pub mod numbers;
pub mod pattern;

mod error;
mod text;

pub use dates::{DateMatch, DateParser, DurationMatch};
pub use error::{Result, TextProcessingError};
pub use language::LanguageIdentifier;
pub use money::{MoneyMatch, MoneyParser};
pub use normalizer::Normalizer;
pub use pattern::{MatchTier, PatternExtractor};
