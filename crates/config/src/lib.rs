//! Configuration management for the travel inquiry engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (TRAVEL_INQUIRY prefix)
//! - A YAML lexicon file replacing the built-in lexicon
//!
//! Every threshold the engine uses lives here; components receive their
//! section of [`Settings`] at construction.

pub mod constants;
pub mod lexicon;
pub mod settings;

pub use lexicon::{GazetteerEntry, Lexicon};
pub use settings::{
    load_settings, ClassifierConfig, FusionConfig, LanguageConfig, ModelBackend,
    ObservabilityConfig, PatternConfig, PipelineConfig, RuntimeEnvironment, Settings,
    StatisticalConfig, ValidationConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for travel_inquiry_core::Error {
    fn from(err: ConfigError) -> Self {
        travel_inquiry_core::Error::Config(err.to_string())
    }
}
