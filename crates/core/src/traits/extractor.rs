//! Extraction strategy trait

use async_trait::async_trait;

use crate::field::{ExtractedField, ExtractionSource};
use crate::language::LanguageProfile;
use crate::message::NormalizedText;

/// Output of one extractor run
///
/// Extractors never fail a message: an unavailable backend yields an empty
/// report with `degraded` set.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub extractor: String,
    pub source: ExtractionSource,
    pub candidates: Vec<ExtractedField>,
    pub degraded: Option<String>,
}

impl ExtractionReport {
    pub fn new(extractor: impl Into<String>, source: ExtractionSource, candidates: Vec<ExtractedField>) -> Self {
        Self {
            extractor: extractor.into(),
            source,
            candidates,
            degraded: None,
        }
    }

    pub fn degraded(extractor: impl Into<String>, source: ExtractionSource, reason: impl Into<String>) -> Self {
        Self {
            extractor: extractor.into(),
            source,
            candidates: Vec::new(),
            degraded: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Strategy that proposes candidate fields from normalized text
///
/// Implementations:
/// - `PatternExtractor`: lexicon and regex rules
/// - `StatisticalExtractor`: model-backed entity recognition
///
/// # Example
///
/// ```ignore
/// let report = extractor.extract(&normalized, &profile).await;
/// for candidate in &report.candidates {
///     println!("{} = {} ({:.2})", candidate.field, candidate.value, candidate.confidence);
/// }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync + 'static {
    async fn extract(&self, text: &NormalizedText, profile: &LanguageProfile) -> ExtractionReport;

    fn source(&self) -> ExtractionSource;

    fn name(&self) -> &str;
}
