//! Per-message pipeline
//!
//! normalize → identify language → extract (all extractors concurrently) →
//! fuse → classify → validate
//!
//! Each run owns its state. The only thing shared between runs is the entity
//! model handle, which is immutable after construction.

use std::sync::Arc;
use futures::stream::{self, StreamExt};
use tracing::Instrument;
use travel_inquiry_config::Settings;
use travel_inquiry_core::{
    EntityModel, ExtractionReport, Extractor, LanguageProfile, NormalizedText, ProcessingIssue,
    RawMessage, Result, ValidatedRecord,
};
use travel_inquiry_llm::{create_entity_model, StatisticalExtractor};
use travel_inquiry_text_processing::{LanguageIdentifier, Normalizer, PatternExtractor};
use uuid::Uuid;

use crate::classifier::InquiryClassifier;
use crate::fusion::FusionEngine;
use crate::validator::{RecordValidator, ValidationContext};

/// End-to-end processor for raw inquiries
pub struct InquiryPipeline {
    normalizer: Normalizer,
    language: LanguageIdentifier,
    extractors: Vec<Arc<dyn Extractor>>,
    fusion: FusionEngine,
    classifier: InquiryClassifier,
    validator: RecordValidator,
    max_concurrent: usize,
}

impl InquiryPipeline {
    /// Build the pipeline with the backend named in `settings.statistical`
    pub fn new(settings: &Settings) -> Result<Self> {
        let model = create_entity_model(&settings.statistical)?;
        Self::from_settings(settings, model)
    }

    /// Build the pipeline around an already constructed entity model
    pub fn from_settings(settings: &Settings, model: Arc<dyn EntityModel>) -> Result<Self> {
        let pattern = PatternExtractor::new(&settings.pattern, &settings.lexicon)?;
        let statistical = StatisticalExtractor::new(
            model,
            &settings.statistical,
            &settings.pattern,
            &settings.lexicon,
        )?;

        Ok(Self {
            normalizer: Normalizer::new(),
            language: LanguageIdentifier::new(&settings.language),
            extractors: vec![
                Arc::new(pattern) as Arc<dyn Extractor>,
                Arc::new(statistical) as Arc<dyn Extractor>,
            ],
            fusion: FusionEngine::new(settings.fusion.clone()),
            classifier: InquiryClassifier::new(&settings.classifier, &settings.lexicon)?,
            validator: RecordValidator::new(settings.validation.clone()),
            max_concurrent: settings.pipeline.max_concurrent_messages.max(1),
        })
    }

    /// Add a further extraction strategy; fusion treats it by its source
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn extractor_names(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Process one message
    ///
    /// Returns `Error::Validation` when a required identifying field is
    /// absent; the error carries everything needed for human escalation.
    pub async fn process(&self, message: &RawMessage) -> Result<ValidatedRecord> {
        let run_id = Uuid::new_v4();
        self.run(run_id, message)
            .instrument(tracing::info_span!("inquiry", %run_id))
            .await
    }

    async fn run(&self, run_id: Uuid, message: &RawMessage) -> Result<ValidatedRecord> {
        let text = self.normalizer.normalize(message);
        let profile = self.language.identify(text.as_str());
        tracing::debug!(
            language = %profile.primary_language,
            mixture_ratio = profile.mixture_ratio,
            confidence = profile.confidence,
            tokens = text.token_count(),
            "Normalized message"
        );

        let reports = self.extract(&text, &profile).await;

        let mut issues: Vec<ProcessingIssue> = reports
            .iter()
            .filter_map(|report| {
                report.degraded.as_ref().map(|reason| ProcessingIssue::DegradedExtraction {
                    extractor: report.extractor.clone(),
                    reason: reason.clone(),
                })
            })
            .collect();

        let outcome = self.fusion.fuse(&reports);
        issues.extend(outcome.errors.into_iter().map(ProcessingIssue::Fusion));

        let classification = self.classifier.classify(&outcome.record, &text);
        tracing::info!(
            inquiry_type = %classification.inquiry_type,
            confidence = classification.confidence,
            fields = outcome.record.len(),
            "Classified inquiry"
        );

        let context = ValidationContext {
            run_id,
            sender: message.sender.clone(),
            language: profile,
            issues,
        };
        let record = self.validator.validate(outcome.record, classification, context)?;

        tracing::info!(
            overall_confidence = record.summary.overall_confidence,
            degraded = record.summary.degraded,
            issues = record.issues.len(),
            "Inquiry processed"
        );
        Ok(record)
    }

    /// Process many messages with bounded concurrency
    ///
    /// Outcomes come back in input order, one per message.
    pub async fn process_batch(&self, messages: Vec<RawMessage>) -> Vec<Result<ValidatedRecord>> {
        tracing::info!(
            messages = messages.len(),
            max_concurrent = self.max_concurrent,
            "Processing batch"
        );

        stream::iter(messages)
            .map(|message| async move { self.process(&message).await })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Run every extractor; fusion waits for all of them
    async fn extract(
        &self,
        text: &NormalizedText,
        profile: &LanguageProfile,
    ) -> Vec<ExtractionReport> {
        let runs = self.extractors.iter().map(|extractor| extractor.extract(text, profile));
        futures::future::join_all(runs).await
    }
}

impl std::fmt::Debug for InquiryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InquiryPipeline")
            .field("extractors", &self.extractor_names())
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use travel_inquiry_core::{EntitySpan, Error, FieldName};
    use travel_inquiry_llm::DisabledEntityModel;

    struct Silent;

    #[async_trait]
    impl EntityModel for Silent {
        async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
            Ok(Vec::new())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    fn pipeline(model: Arc<dyn EntityModel>) -> InquiryPipeline {
        InquiryPipeline::from_settings(&Settings::default(), model).unwrap()
    }

    #[test]
    fn test_default_extractors() {
        let pipeline = pipeline(Arc::new(Silent));
        assert_eq!(pipeline.extractor_names().len(), 2);
    }

    #[tokio::test]
    async fn test_pattern_only_run_is_degraded() {
        let pipeline = pipeline(Arc::new(DisabledEntityModel));
        let record = pipeline
            .process(&RawMessage::new("2 people, Goa trip for 5 days, budget 50k").with_sender("a@b.in"))
            .await
            .unwrap();

        assert!(record.is_degraded());
        assert_eq!(record.sender.as_deref(), Some("a@b.in"));
        assert_eq!(record.destinations(), ["Goa".to_string()]);
    }

    #[tokio::test]
    async fn test_rejection_is_validation_error() {
        let pipeline = pipeline(Arc::new(Silent));
        let err = pipeline.process(&RawMessage::new("")).await.unwrap_err();
        match err {
            Error::Validation(rejected) => {
                assert_eq!(rejected.missing_fields, vec![FieldName::Destinations]);
                assert!(rejected.record.is_empty());
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let pipeline = pipeline(Arc::new(Silent));
        let outcomes = pipeline
            .process_batch(vec![
                RawMessage::new("Trip to Goa for 2 people"),
                RawMessage::new(""),
                RawMessage::new("Kerala trip, 4 nights"),
            ])
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].as_ref().unwrap().destinations(), ["Goa".to_string()]);
        assert!(outcomes[1].as_ref().is_err_and(|e| e.is_validation()));
        assert_eq!(outcomes[2].as_ref().unwrap().destinations(), ["Kerala".to_string()]);
    }
}
