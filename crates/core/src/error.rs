//! Error taxonomy
//!
//! Absence of a field is never an error. Extractor failures degrade and are
//! recorded as [`crate::ProcessingIssue`]s; only validation is message-fatal.

use crate::field::{ExtractionSource, FieldName, FieldValue};
use crate::record::{FusedRecord, InquiryClassification, ProcessingIssue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One extractor proposed conflicting values for a scalar field
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{extractor} extractor produced contradictory {field} candidates: {first} vs {second}")]
pub struct FusionError {
    pub field: FieldName,
    pub extractor: ExtractionSource,
    pub first: FieldValue,
    pub second: FieldValue,
}

/// A required identifying field is unrecoverably absent
///
/// Carries the fused record and classification so the caller can escalate
/// the message to a human without re-running the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
    pub missing_fields: Vec<FieldName>,
    pub classification: InquiryClassification,
    pub record: FusedRecord,
    pub issues: Vec<ProcessingIssue>,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error(transparent)]
    Validation(Box<ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(Box::new(err))
    }
}

impl Error {
    /// Whether the message should go to a human
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
