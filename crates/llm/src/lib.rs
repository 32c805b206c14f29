//! Model-backed statistical extraction
//!
//! Features:
//! - Entity recognition over a local LLM (Ollama chat API, JSON output)
//! - Retry with doubling backoff, bounded by a per-call timeout
//! - A disabled backend that is always unavailable
//! - The statistical extractor: maps entity spans onto the field catalog

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod prompt;

pub use adapter::StatisticalExtractor;
pub use backend::{DisabledEntityModel, OllamaEntityModel};
pub use factory::create_entity_model;
pub use prompt::{extraction_messages, parse_entities, Message, Role};

use thiserror::Error;

/// Model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Network(err.to_string())
        }
    }
}

impl From<ModelError> for travel_inquiry_core::Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Network(_) | ModelError::Timeout | ModelError::Unavailable(_) => {
                travel_inquiry_core::Error::ModelUnavailable(err.to_string())
            },
            ModelError::Configuration(msg) => travel_inquiry_core::Error::Config(msg),
            other => travel_inquiry_core::Error::Model(other.to_string()),
        }
    }
}
