//! Integration tests for the inquiry pipeline (normalize -> extract -> fuse -> classify -> validate)
//!
//! The statistical side runs against in-process models so no model server is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use travel_inquiry_config::Settings;
use travel_inquiry_core::{
    EntityLabel, EntityModel, EntitySpan, Error, ExtractionSource, FieldName, FieldStatus,
    FieldValue, FusionDecision, InquiryType, Money, PreferenceTag, PrimaryLanguage,
    ProcessingIssue, RawMessage, Result,
};
use travel_inquiry_engine::validator::LEXICAL_INTENT_MARKER;
use travel_inquiry_engine::InquiryPipeline;

/// Returns a fixed span list for any text containing `trigger`
struct ScriptedModel {
    script: Vec<(&'static str, Vec<EntitySpan>)>,
}

#[async_trait]
impl EntityModel for ScriptedModel {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        Ok(self
            .script
            .iter()
            .find(|(trigger, _)| text.contains(trigger))
            .map(|(_, spans)| spans.clone())
            .unwrap_or_default())
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Simulated outage
struct OfflineModel;

#[async_trait]
impl EntityModel for OfflineModel {
    async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        Err(Error::ModelUnavailable("connection refused".into()))
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

/// Sleeps per call and records how many calls overlap
#[derive(Default)]
struct CountingModel {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl EntityModel for CountingModel {
    async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "counting"
    }
}

fn pipeline(model: Arc<dyn EntityModel>) -> InquiryPipeline {
    InquiryPipeline::from_settings(&Settings::default(), model).unwrap()
}

fn silent() -> Arc<dyn EntityModel> {
    Arc::new(ScriptedModel { script: Vec::new() })
}

fn message(body: &str) -> RawMessage {
    RawMessage::new(body).with_received_at(Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap())
}

/// Simple English inquiry with both extractors agreeing
#[tokio::test]
async fn test_single_leg_inquiry() {
    let model = ScriptedModel {
        script: vec![(
            "Goa trip",
            vec![
                EntitySpan::new(EntityLabel::Person, "2 people", 0.9),
                EntitySpan::new(EntityLabel::Place, "Goa", 0.95),
                EntitySpan::new(EntityLabel::Date, "5 days", 0.8),
                EntitySpan::new(EntityLabel::Money, "50k", 0.85),
            ],
        )],
    };
    let record = pipeline(Arc::new(model))
        .process(&message("2 people, Goa trip for 5 days, budget 50k"))
        .await
        .unwrap();

    assert_eq!(record.value(FieldName::TravelerCount), Some(&FieldValue::Integer(2)));
    assert_eq!(record.destinations(), ["Goa".to_string()]);
    let budget = record.value(FieldName::Budget).and_then(FieldValue::as_money).unwrap();
    assert!(budget.approx_eq(&Money::inr(50_000.0)));
    let dates = record.value(FieldName::TravelDates).and_then(FieldValue::as_date_range).unwrap();
    assert_eq!(dates.duration_days, Some(5));
    assert_eq!(record.inquiry_type(), InquiryType::SingleLeg);

    assert_eq!(record.decisions.get(&FieldName::TravelerCount), Some(&FusionDecision::Agreement));
    assert!(!record.is_degraded());
    assert_eq!(record.language.primary_language, PrimaryLanguage::English);
}

/// Three hyphenated destinations make a multi-leg trip
#[tokio::test]
async fn test_multi_leg_inquiry() {
    let record = pipeline(silent())
        .process(&message("Delhi-Agra-Jaipur for family of 4, honeymoon package, 8 days"))
        .await
        .unwrap();

    assert_eq!(
        record.destinations(),
        ["Delhi".to_string(), "Agra".to_string(), "Jaipur".to_string()]
    );
    assert_eq!(record.value(FieldName::TravelerCount), Some(&FieldValue::Integer(4)));
    let tags = record.value(FieldName::Preferences).and_then(FieldValue::as_tags).unwrap();
    assert!(tags.contains(&PreferenceTag::Honeymoon));
    assert_eq!(record.inquiry_type(), InquiryType::MultiLeg);
    assert!(record.classification.has_signal("destinations_count>1"));
}

/// A booking reference outranks every other signal
#[tokio::test]
async fn test_modification_by_reference() {
    let record = pipeline(silent())
        .process(&message("please modify my booking ref AB1234, add one more traveler"))
        .await
        .unwrap();

    assert_eq!(record.value(FieldName::ReferenceId), Some(&FieldValue::Text("AB1234".into())));
    assert_eq!(record.inquiry_type(), InquiryType::Modification);
    assert!(record.classification.has_signal("reference_id_present"));
}

/// A reply that asks for changes without a reference falls back to lexical intent
#[tokio::test]
async fn test_modification_without_reference() {
    let reply = message("We would like to change the dates to next month")
        .with_subject("Re: Goa trip quote");
    let record = pipeline(silent()).process(&reply).await.unwrap();

    assert_eq!(record.inquiry_type(), InquiryType::Modification);
    assert_eq!(
        record.status(FieldName::ReferenceId),
        &FieldStatus::Fallback {
            marker: LEXICAL_INTENT_MARKER.to_string()
        }
    );
}

/// Empty text is rejected for human escalation, never dropped
#[tokio::test]
async fn test_empty_message_rejected() {
    let err = pipeline(silent()).process(&message("   ")).await.unwrap_err();
    assert!(err.is_validation());

    let Error::Validation(rejected) = err else {
        panic!("expected a validation error");
    };
    assert!(rejected.record.is_empty());
    assert_eq!(rejected.missing_fields, vec![FieldName::Destinations]);
    assert_eq!(rejected.classification.inquiry_type, InquiryType::SingleLeg);
    assert_eq!(rejected.classification.confidence, 0.0);
}

/// With no identifying field configured, garbage comes back all unknown
#[tokio::test]
async fn test_garbage_message_all_unknown() {
    let mut settings = Settings::default();
    settings.validation.required_fields.insert(InquiryType::SingleLeg, Vec::new());
    settings.validation.identifying_fields.insert(InquiryType::SingleLeg, Vec::new());
    let pipeline = InquiryPipeline::from_settings(&settings, silent()).unwrap();

    let record = pipeline.process(&message("@@@ ### !!!")).await.unwrap();
    assert_eq!(record.fields.len(), FieldName::ALL.len());
    assert!(FieldName::ALL.iter().all(|f| record.is_unknown(*f)));
    assert_eq!(record.language.confidence, 0.0);
    assert_eq!(record.summary.overall_confidence, 0.0);
}

/// An unavailable model leaves a pattern-only record flagged as degraded
#[tokio::test]
async fn test_statistical_outage_degrades() {
    let record = pipeline(Arc::new(OfflineModel))
        .process(&message("2 people, Goa trip for 5 days, budget 50k"))
        .await
        .unwrap();

    assert!(record.is_degraded());
    assert!(record
        .issues
        .iter()
        .any(|i| matches!(i, ProcessingIssue::DegradedExtraction { extractor, .. } if extractor == "statistical")));
    assert_eq!(record.destinations(), ["Goa".to_string()]);
    assert_eq!(record.sources().into_iter().collect::<Vec<_>>(), vec![ExtractionSource::Pattern]);
    assert!(record
        .decisions
        .values()
        .all(|d| *d == FusionDecision::SingleSource));
}

/// Model-only destinations are merged behind the pattern ones
#[tokio::test]
async fn test_destinations_merged_across_sources() {
    let model = ScriptedModel {
        script: vec![(
            "Goa",
            vec![
                EntitySpan::new(EntityLabel::Place, "Goa", 0.9),
                EntitySpan::new(EntityLabel::Place, "Coorg", 0.8),
            ],
        )],
    };
    let record = pipeline(Arc::new(model))
        .process(&message("Kerala and Goa in May, then a few days in Coorg"))
        .await
        .unwrap();

    let places = record.destinations();
    assert_eq!(places.first().map(String::as_str), Some("Kerala"));
    assert!(places.iter().any(|p| p == "Coorg"));
    assert_eq!(places.iter().filter(|p| p.as_str() == "Goa").count(), 1);
}

/// Same input, same output
#[tokio::test]
async fn test_deterministic_output() {
    let pipeline = pipeline(silent());
    let input = message("Family of 4 from Mumbai to Goa and Kerala, 10-15 May, budget ₹1.5 lakh");

    let first = pipeline.process(&input).await.unwrap();
    let second = pipeline.process(&input).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.fields, second.fields);
    assert_eq!(first.classification, second.classification);
    assert_eq!(first.summary, second.summary);
}

/// Every catalog field appears once in the output
#[tokio::test]
async fn test_one_status_per_field() {
    let record = pipeline(silent())
        .process(&message("Family of 4 from Mumbai to Goa and Kerala, 10-15 May, beach and luxury"))
        .await
        .unwrap();

    assert_eq!(record.fields.len(), FieldName::ALL.len());
    assert_eq!(
        record.value(FieldName::DepartureCity),
        Some(&FieldValue::Text("Mumbai".into()))
    );
    assert!(!record.destinations().iter().any(|p| p == "Mumbai"));
}

/// Batch runs overlap model calls and keep input order
#[tokio::test]
async fn test_batch_runs_concurrently() {
    let model = Arc::new(CountingModel::default());
    let mut settings = Settings::default();
    settings.pipeline.max_concurrent_messages = 4;
    let pipeline = InquiryPipeline::from_settings(&settings, model.clone()).unwrap();

    let destinations = ["Goa", "Kerala", "Manali", "Jaipur", "Shimla", "Ooty"];
    let messages = destinations
        .iter()
        .map(|d| message(&format!("Trip to {} for 2 people", d)))
        .collect();

    let outcomes = pipeline.process_batch(messages).await;
    assert_eq!(outcomes.len(), destinations.len());
    for (outcome, expected) in outcomes.iter().zip(destinations) {
        assert_eq!(outcome.as_ref().unwrap().destinations(), [expected.to_string()]);
    }

    let peak = model.peak.load(Ordering::SeqCst);
    assert!(peak > 1 && peak <= 4, "peak concurrency was {}", peak);
}

/// Hotel class, meal plan, flights and urgency come through as special requests
#[tokio::test]
async fn test_trip_requirements_reach_special_requests() {
    let record = pipeline(silent())
        .process(&message(
            "2 people to Goa, 3 star hotel with breakfast only. Flights not required. Please send the quote ASAP",
        ))
        .await
        .unwrap();

    let requests = record
        .value(FieldName::SpecialRequests)
        .and_then(FieldValue::as_requests)
        .unwrap();
    assert_eq!(
        requests,
        ["3-star hotel", "meal plan: breakfast only", "flights not required", "respond asap"]
    );
    assert_eq!(record.destinations(), ["Goa".to_string()]);
}
