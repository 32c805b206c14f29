//! Core types and traits for travel inquiry extraction
//!
//! This crate provides the types shared by every other crate:
//! - Message and language types
//! - The field catalog and extraction candidates
//! - Fused, classified and validated records
//! - Extractor and entity-model traits
//! - Error types

pub mod error;
pub mod field;
pub mod language;
pub mod message;
pub mod record;
pub mod traits;

pub use error::{Error, FusionError, Result, ValidationError};
pub use field::{
    merge_unique_ci, overlap_in_same_order, DateRange, ExtractedField, ExtractionSource, FieldName,
    FieldValue, Money, PreferenceTag, Span,
};
pub use language::{LanguageProfile, PrimaryLanguage, Script};
pub use message::{NormalizedText, RawMessage};
pub use record::{
    ConfidenceSummary, FieldStatus, FusedRecord, FusionDecision, InquiryClassification,
    InquiryType, ProcessingIssue, ValidatedRecord,
};
pub use traits::{EntityLabel, EntityModel, EntitySpan, ExtractionReport, Extractor};
