//! Fused, classified and validated records

use crate::error::FusionError;
use crate::field::{ExtractedField, ExtractionSource, FieldName, FieldValue};
use crate::language::LanguageProfile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// How the authoritative value of a field was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionDecision {
    /// Only one source proposed the field
    SingleSource,
    /// Sources agreed; agreement bonus applied
    Agreement,
    PatternPrecedence,
    StatisticalPrecedence,
    /// Collection values unioned across sources
    Merged,
}

/// One authoritative value per catalog field, or none
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedRecord {
    fields: BTreeMap<FieldName, ExtractedField>,
    decisions: BTreeMap<FieldName, FusionDecision>,
}

impl FusedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authoritative value, replacing any previous one
    pub fn insert(&mut self, field: ExtractedField, decision: FusionDecision) {
        let name = field.field;
        self.fields.insert(name, field);
        self.decisions.insert(name, decision);
    }

    pub fn remove(&mut self, name: FieldName) -> Option<ExtractedField> {
        self.decisions.remove(&name);
        self.fields.remove(&name)
    }

    pub fn get(&self, name: FieldName) -> Option<&ExtractedField> {
        self.fields.get(&name)
    }

    pub fn value(&self, name: FieldName) -> Option<&FieldValue> {
        self.fields.get(&name).map(|f| &f.value)
    }

    pub fn decision(&self, name: FieldName) -> Option<FusionDecision> {
        self.decisions.get(&name).copied()
    }

    pub fn decisions(&self) -> &BTreeMap<FieldName, FusionDecision> {
        &self.decisions
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedField> {
        self.fields.values()
    }

    /// Destinations in mention order; empty when absent
    pub fn destinations(&self) -> &[String] {
        self.value(FieldName::Destinations)
            .and_then(FieldValue::as_places)
            .unwrap_or(&[])
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.value(FieldName::ReferenceId).and_then(FieldValue::as_text)
    }

    pub fn traveler_count(&self) -> Option<u32> {
        self.value(FieldName::TravelerCount).and_then(FieldValue::as_integer)
    }
}

/// Shape of an inquiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    SingleLeg,
    MultiLeg,
    Modification,
}

impl InquiryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleLeg => "single_leg",
            Self::MultiLeg => "multi_leg",
            Self::Modification => "modification",
        }
    }
}

impl fmt::Display for InquiryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryClassification {
    #[serde(rename = "type")]
    pub inquiry_type: InquiryType,
    pub confidence: f32,
    pub rationale_signals: BTreeSet<String>,
}

impl InquiryClassification {
    pub fn new<I, S>(inquiry_type: InquiryType, confidence: f32, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inquiry_type,
            confidence: confidence.clamp(0.0, 1.0),
            rationale_signals: signals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_signal(&self, signal: &str) -> bool {
        self.rationale_signals.contains(signal)
    }
}

/// Status of one catalog field in the final record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    Present(ExtractedField),
    Unknown,
    /// Not found, but a documented fallback applies
    Fallback { marker: String },
}

impl FieldStatus {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn field(&self) -> Option<&ExtractedField> {
        match self {
            Self::Present(field) => Some(field),
            _ => None,
        }
    }
}

/// Non-fatal condition attached to the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingIssue {
    DegradedExtraction { extractor: String, reason: String },
    Fusion(FusionError),
    /// A field value failed a sanity check and was dropped
    Repair { field: FieldName, reason: String },
    Downgrade { from: InquiryType, to: InquiryType, reason: String },
}

impl ProcessingIssue {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::DegradedExtraction { .. })
    }
}

/// Routing hint for reply automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub overall_confidence: f32,
    pub low_confidence_fields: BTreeSet<FieldName>,
    /// Set when an extractor was unavailable
    pub degraded: bool,
}

/// Terminal artifact of one message run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub run_id: Uuid,
    pub sender: Option<String>,
    pub language: LanguageProfile,
    /// Every catalog field, present or explicitly unknown
    pub fields: BTreeMap<FieldName, FieldStatus>,
    pub classification: InquiryClassification,
    pub decisions: BTreeMap<FieldName, FusionDecision>,
    pub issues: Vec<ProcessingIssue>,
    pub summary: ConfidenceSummary,
}

static UNKNOWN: FieldStatus = FieldStatus::Unknown;

impl ValidatedRecord {
    pub fn status(&self, name: FieldName) -> &FieldStatus {
        self.fields.get(&name).unwrap_or(&UNKNOWN)
    }

    pub fn field(&self, name: FieldName) -> Option<&ExtractedField> {
        self.status(name).field()
    }

    pub fn value(&self, name: FieldName) -> Option<&FieldValue> {
        self.field(name).map(|f| &f.value)
    }

    pub fn is_unknown(&self, name: FieldName) -> bool {
        matches!(self.status(name), FieldStatus::Unknown)
    }

    pub fn inquiry_type(&self) -> InquiryType {
        self.classification.inquiry_type
    }

    pub fn destinations(&self) -> &[String] {
        self.value(FieldName::Destinations)
            .and_then(FieldValue::as_places)
            .unwrap_or(&[])
    }

    pub fn is_degraded(&self) -> bool {
        self.summary.degraded
    }

    /// Sources that contributed present fields
    pub fn sources(&self) -> BTreeSet<ExtractionSource> {
        self.fields
            .values()
            .filter_map(FieldStatus::field)
            .map(|f| f.source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ExtractionSource;

    #[test]
    fn test_fused_record_holds_one_value_per_field() {
        let mut record = FusedRecord::new();
        record.insert(
            ExtractedField::new(FieldName::TravelerCount, FieldValue::Integer(2), ExtractionSource::Pattern, 0.9),
            FusionDecision::SingleSource,
        );
        record.insert(
            ExtractedField::new(FieldName::TravelerCount, FieldValue::Integer(3), ExtractionSource::Statistical, 0.7),
            FusionDecision::StatisticalPrecedence,
        );
        assert_eq!(record.len(), 1);
        assert_eq!(record.traveler_count(), Some(3));
        assert_eq!(record.decision(FieldName::TravelerCount), Some(FusionDecision::StatisticalPrecedence));
        assert!(record.destinations().is_empty());
    }

    #[test]
    fn test_classification_serializes_type_key() {
        let c = InquiryClassification::new(InquiryType::MultiLeg, 0.8, ["destinations_count>1"]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "multi_leg");
        assert!(c.has_signal("destinations_count>1"));
    }

    #[test]
    fn test_field_status_tags() {
        let json = serde_json::to_value(FieldStatus::Unknown).unwrap();
        assert_eq!(json["status"], "unknown");
    }
}
