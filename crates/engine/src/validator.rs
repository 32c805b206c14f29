//! Record validation
//!
//! Checks the classified record before it leaves the engine:
//! - value ranges: traveler_count in `1..=max_travelers`, travel dates in
//!   order; failing values are dropped and reported as repairs
//! - cross-field consistency: multi_leg with fewer than two destinations is
//!   downgraded to single_leg
//! - required fields per type: present, unknown, or a fallback marker
//!
//! Only a missing identifying field with no fallback rejects the message.

use std::collections::BTreeMap;
use travel_inquiry_config::ValidationConfig;
use travel_inquiry_core::{
    ConfidenceSummary, FieldName, FieldStatus, FieldValue, FusedRecord, InquiryClassification,
    InquiryType, LanguageProfile, ProcessingIssue, ValidatedRecord, ValidationError,
};
use uuid::Uuid;

use crate::classifier::MODIFICATION_LEXICON_SIGNAL;

/// Marker used when a modification names no reference but says it modifies
pub const LEXICAL_INTENT_MARKER: &str = "lexical_intent";

/// Signal added when a multi-leg classification is downgraded
pub const DOWNGRADE_SIGNAL: &str = "downgraded_from_multi_leg";

/// Audit context carried into the validated record
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub run_id: Uuid,
    pub sender: Option<String>,
    pub language: LanguageProfile,
    /// Issues gathered by earlier stages
    pub issues: Vec<ProcessingIssue>,
}

impl ValidationContext {
    pub fn new(language: LanguageProfile) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            sender: None,
            language,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordValidator {
    config: ValidationConfig,
}

impl RecordValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        mut record: FusedRecord,
        mut classification: InquiryClassification,
        mut context: ValidationContext,
    ) -> Result<ValidatedRecord, ValidationError> {
        self.repair_ranges(&mut record, &mut context.issues);
        Self::check_legs(&record, &mut classification, &mut context.issues);

        let inquiry_type = classification.inquiry_type;
        let required = self.config.required_for(inquiry_type);
        let identifying = self.config.identifying_for(inquiry_type);

        let mut fields = BTreeMap::new();
        let mut missing = Vec::new();
        for name in FieldName::ALL {
            let status = match record.get(name) {
                Some(field) => FieldStatus::Present(field.clone()),
                None if required.contains(&name) && identifying.contains(&name) => {
                    match Self::fallback(name, &classification) {
                        Some(marker) => {
                            tracing::info!(field = %name, marker, "Required field absent; fallback applies");
                            FieldStatus::Fallback {
                                marker: marker.to_string(),
                            }
                        },
                        None => {
                            missing.push(name);
                            FieldStatus::Unknown
                        },
                    }
                },
                None => FieldStatus::Unknown,
            };
            fields.insert(name, status);
        }

        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(FieldName::as_str).collect();
            let reason = format!(
                "{} inquiry is missing identifying field(s): {}",
                inquiry_type,
                names.join(", ")
            );
            tracing::warn!(run_id = %context.run_id, %reason, "Rejecting record");
            return Err(ValidationError {
                reason,
                missing_fields: missing,
                classification,
                record,
                issues: context.issues,
            });
        }

        let summary = self.summarize(&record, &classification, &context.issues);
        Ok(ValidatedRecord {
            run_id: context.run_id,
            sender: context.sender,
            language: context.language,
            fields,
            decisions: record.decisions().clone(),
            classification,
            issues: context.issues,
            summary,
        })
    }

    fn repair_ranges(&self, record: &mut FusedRecord, issues: &mut Vec<ProcessingIssue>) {
        if let Some(count) = record.traveler_count() {
            if count < 1 || count > self.config.max_travelers {
                record.remove(FieldName::TravelerCount);
                Self::repaired(
                    issues,
                    FieldName::TravelerCount,
                    format!("{} is outside 1..={}", count, self.config.max_travelers),
                );
            }
        }

        let unordered = record
            .value(FieldName::TravelDates)
            .and_then(FieldValue::as_date_range)
            .filter(|range| !range.is_ordered())
            .map(|range| range.to_string());
        if let Some(range) = unordered {
            record.remove(FieldName::TravelDates);
            Self::repaired(issues, FieldName::TravelDates, format!("start after end in {}", range));
        }

        let bad_budget = record
            .value(FieldName::Budget)
            .and_then(FieldValue::as_money)
            .filter(|money| !(money.amount.is_finite() && money.amount > 0.0))
            .map(|money| money.to_string());
        if let Some(budget) = bad_budget {
            record.remove(FieldName::Budget);
            Self::repaired(issues, FieldName::Budget, format!("non-positive amount {}", budget));
        }
    }

    fn repaired(issues: &mut Vec<ProcessingIssue>, field: FieldName, reason: String) {
        tracing::warn!(field = %field, %reason, "Dropping field that failed a range check");
        issues.push(ProcessingIssue::Repair { field, reason });
    }

    fn check_legs(
        record: &FusedRecord,
        classification: &mut InquiryClassification,
        issues: &mut Vec<ProcessingIssue>,
    ) {
        let count = record.destinations().len();
        if classification.inquiry_type != InquiryType::MultiLeg || count >= 2 {
            return;
        }

        let reason = format!("multi_leg needs at least 2 destinations, found {}", count);
        tracing::info!(%reason, "Downgrading to single_leg");
        classification.inquiry_type = InquiryType::SingleLeg;
        classification.confidence *= 0.5;
        classification.rationale_signals.insert(DOWNGRADE_SIGNAL.to_string());
        issues.push(ProcessingIssue::Downgrade {
            from: InquiryType::MultiLeg,
            to: InquiryType::SingleLeg,
            reason,
        });
    }

    /// Documented fallback for an absent identifying field
    fn fallback(field: FieldName, classification: &InquiryClassification) -> Option<&'static str> {
        let lexical = classification
            .rationale_signals
            .iter()
            .any(|s| s.starts_with(MODIFICATION_LEXICON_SIGNAL));
        (field == FieldName::ReferenceId && classification.inquiry_type == InquiryType::Modification && lexical)
            .then_some(LEXICAL_INTENT_MARKER)
    }

    fn summarize(
        &self,
        record: &FusedRecord,
        classification: &InquiryClassification,
        issues: &[ProcessingIssue],
    ) -> ConfidenceSummary {
        let confidences: Vec<f32> = record.iter().map(|f| f.confidence).collect();
        let overall_confidence = if confidences.is_empty() {
            0.0
        } else {
            let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
            0.5 * mean + 0.5 * classification.confidence
        };

        ConfidenceSummary {
            overall_confidence,
            low_confidence_fields: record
                .iter()
                .filter(|f| f.confidence < self.config.low_confidence_threshold)
                .map(|f| f.field)
                .collect(),
            degraded: issues.iter().any(ProcessingIssue::is_degraded),
        }
    }
}
