//! Text processing errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl From<TextProcessingError> for travel_inquiry_core::Error {
    fn from(err: TextProcessingError) -> Self {
        travel_inquiry_core::Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;

/// Compile a regex, reporting the offending source on failure
pub(crate) fn compile(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| TextProcessingError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
