//! Fusion of pattern and statistical candidates
//!
//! Per catalog field:
//! 1. Candidates are grouped by source. A source proposing two different
//!    values for a scalar field is reported as a [`FusionError`] and its
//!    candidates for that field are dropped.
//! 2. One source: its candidate wins unchanged.
//! 3. Both agree: the stronger candidate wins with its confidence multiplied
//!    by the agreement bonus, capped at 1.0.
//! 4. Both disagree: scalars go to the pattern result unless the
//!    statistical confidence beats it by more than the margin; collections
//!    are unioned with pattern values first.
//! 5. No source: the field is absent.

use std::collections::BTreeMap;
use travel_inquiry_config::FusionConfig;
use travel_inquiry_core::{
    merge_unique_ci, ExtractedField, ExtractionReport, ExtractionSource, FieldName, FieldValue,
    FusedRecord, FusionDecision, FusionError,
};

/// Fused record plus the contradictions found on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionOutcome {
    pub record: FusedRecord,
    pub errors: Vec<FusionError>,
}

/// Merges extractor reports into one value per field
#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn fuse(&self, reports: &[ExtractionReport]) -> FusionOutcome {
        let mut outcome = FusionOutcome::default();

        for field in FieldName::ALL {
            let mut by_source: BTreeMap<ExtractionSource, Vec<&ExtractedField>> = BTreeMap::new();
            for candidate in reports.iter().flat_map(|r| &r.candidates).filter(|c| c.field == field) {
                by_source.entry(candidate.source).or_default().push(candidate);
            }

            let mut pattern = None;
            let mut statistical = None;
            for (source, candidates) in by_source {
                let Some((first, rest)) = candidates.split_first() else {
                    continue;
                };
                match collapse(field, source, first, rest) {
                    Ok(candidate) => match source {
                        ExtractionSource::Pattern => pattern = Some(candidate),
                        ExtractionSource::Statistical => statistical = Some(candidate),
                    },
                    Err(err) => {
                        tracing::warn!(error = %err, "Contradictory candidates from one extractor");
                        outcome.errors.push(err);
                    },
                }
            }

            let fused = match (pattern, statistical) {
                (None, None) => continue,
                (Some(only), None) | (None, Some(only)) => (only, FusionDecision::SingleSource),
                (Some(p), Some(s)) => self.resolve(p, s),
            };

            tracing::debug!(
                field = %field,
                value = %fused.0.value,
                source = %fused.0.source,
                confidence = fused.0.confidence,
                decision = ?fused.1,
                "Fused field"
            );
            outcome.record.insert(fused.0, fused.1);
        }

        outcome
    }

    /// Both sources proposed a value
    fn resolve(&self, pattern: ExtractedField, statistical: ExtractedField) -> (ExtractedField, FusionDecision) {
        let field = pattern.field;

        if pattern.value.agrees_with(&statistical.value) {
            let confidence = (pattern.confidence.max(statistical.confidence) * self.config.agreement_bonus).min(1.0);
            let mut winner = if statistical.confidence > pattern.confidence {
                statistical.clone()
            } else {
                pattern.clone()
            };
            if !field.is_scalar() {
                winner.value = union(&pattern.value, &statistical.value);
            }
            winner.confidence = confidence;
            return (winner, FusionDecision::Agreement);
        }

        if field.is_scalar() {
            if statistical.confidence - pattern.confidence > self.config.disagreement_margin {
                return (statistical, FusionDecision::StatisticalPrecedence);
            }
            return (pattern, FusionDecision::PatternPrecedence);
        }

        // Destinations keep the gazetteer reading; free-text sets lean statistical
        let mut merged = match field {
            FieldName::Destinations => pattern.clone(),
            _ => statistical.clone(),
        };
        merged.value = union(&pattern.value, &statistical.value);
        merged.span = match (pattern.span, statistical.span) {
            (Some(a), Some(b)) => Some(a.cover(b)),
            (a, b) => a.or(b),
        };
        (merged, FusionDecision::Merged)
    }
}

/// Reduce one source's candidates for a field to a single candidate
fn collapse(
    field: FieldName,
    source: ExtractionSource,
    first: &ExtractedField,
    rest: &[&ExtractedField],
) -> Result<ExtractedField, FusionError> {
    if field.is_scalar() {
        if let Some(conflict) = rest.iter().find(|c| !c.value.same_as(&first.value)) {
            return Err(FusionError {
                field,
                extractor: source,
                first: first.value.clone(),
                second: conflict.value.clone(),
            });
        }
        let best = rest
            .iter()
            .copied()
            .fold(first, |best, c| if c.confidence > best.confidence { c } else { best });
        return Ok(best.clone());
    }

    let mut merged = first.clone();
    for other in rest {
        merged.value = union(&merged.value, &other.value);
        merged.confidence = merged.confidence.max(other.confidence);
        merged.span = match (merged.span, other.span) {
            (Some(a), Some(b)) => Some(a.cover(b)),
            (a, b) => a.or(b),
        };
    }
    Ok(merged)
}

/// Union of two collection values, left first; scalars keep the left value
fn union(left: &FieldValue, right: &FieldValue) -> FieldValue {
    match (left, right) {
        (FieldValue::Places(a), FieldValue::Places(b)) => {
            let mut merged = Vec::with_capacity(a.len() + b.len());
            merge_unique_ci(&mut merged, a.iter().chain(b));
            FieldValue::Places(merged)
        },
        (FieldValue::Requests(a), FieldValue::Requests(b)) => {
            let mut merged = Vec::with_capacity(a.len() + b.len());
            merge_unique_ci(&mut merged, a.iter().chain(b));
            FieldValue::Requests(merged)
        },
        (FieldValue::Tags(a), FieldValue::Tags(b)) => FieldValue::Tags(a.union(b).copied().collect()),
        _ => left.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use travel_inquiry_core::{Money, PreferenceTag, Span};

    fn engine() -> FusionEngine {
        FusionEngine::new(FusionConfig::default())
    }

    fn candidate(field: FieldName, value: FieldValue, source: ExtractionSource, confidence: f32) -> ExtractedField {
        ExtractedField::new(field, value, source, confidence)
    }

    fn report(source: ExtractionSource, candidates: Vec<ExtractedField>) -> ExtractionReport {
        ExtractionReport::new(source.as_str(), source, candidates)
    }

    fn places(names: &[&str]) -> FieldValue {
        FieldValue::Places(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_single_source_unchanged() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(2), ExtractionSource::Pattern, 0.95)],
            ),
            report(ExtractionSource::Statistical, vec![]),
        ]);
        let field = outcome.record.get(FieldName::TravelerCount).unwrap();
        assert_eq!(field.confidence, 0.95);
        assert_eq!(outcome.record.decision(FieldName::TravelerCount), Some(FusionDecision::SingleSource));
        assert_eq!(outcome.record.len(), 1);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_agreement_bonus_capped() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::Budget, FieldValue::Money(Money::inr(50000.0)), ExtractionSource::Pattern, 0.95)],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::Budget, FieldValue::Money(Money::inr(50000.0)), ExtractionSource::Statistical, 0.7)],
            ),
        ]);
        let budget = outcome.record.get(FieldName::Budget).unwrap();
        assert_eq!(budget.confidence, 1.0);
        assert_eq!(budget.source, ExtractionSource::Pattern);
        assert_eq!(outcome.record.decision(FieldName::Budget), Some(FusionDecision::Agreement));
    }

    #[test]
    fn test_agreement_is_monotonic() {
        for (p, s) in [(0.5, 0.6), (0.8, 0.3), (0.0, 0.0), (0.9, 0.9)] {
            let outcome = engine().fuse(&[
                report(
                    ExtractionSource::Pattern,
                    vec![candidate(FieldName::TravelerCount, FieldValue::Integer(3), ExtractionSource::Pattern, p)],
                ),
                report(
                    ExtractionSource::Statistical,
                    vec![candidate(FieldName::TravelerCount, FieldValue::Integer(3), ExtractionSource::Statistical, s)],
                ),
            ]);
            let fused = outcome.record.get(FieldName::TravelerCount).unwrap().confidence;
            assert!(fused >= p.max(s));
            assert!(fused <= 1.0);
        }
    }

    #[test]
    fn test_disagreement_prefers_pattern_within_margin() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(2), ExtractionSource::Pattern, 0.8)],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(3), ExtractionSource::Statistical, 0.95)],
            ),
        ]);
        assert_eq!(outcome.record.traveler_count(), Some(2));
        assert_eq!(outcome.record.decision(FieldName::TravelerCount), Some(FusionDecision::PatternPrecedence));
    }

    #[test]
    fn test_disagreement_statistical_beyond_margin() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(4), ExtractionSource::Pattern, 0.5)],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(3), ExtractionSource::Statistical, 0.9)],
            ),
        ]);
        assert_eq!(outcome.record.traveler_count(), Some(3));
        assert_eq!(
            outcome.record.decision(FieldName::TravelerCount),
            Some(FusionDecision::StatisticalPrecedence)
        );
    }

    #[test]
    fn test_destinations_union_pattern_first() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::Destinations, places(&["Delhi", "Agra"]), ExtractionSource::Pattern, 0.95)
                    .with_span(Span::new(0, 10))],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::Destinations, places(&["Agra", "delhi", "jaipur"]), ExtractionSource::Statistical, 0.8)
                    .with_span(Span::new(12, 30))],
            ),
        ]);
        let dest = outcome.record.get(FieldName::Destinations).unwrap();
        assert_eq!(dest.value, places(&["Delhi", "Agra", "jaipur"]));
        assert_eq!(dest.span, Some(Span::new(0, 30)));
        assert_eq!(outcome.record.decision(FieldName::Destinations), Some(FusionDecision::Merged));
    }

    #[test]
    fn test_ordered_overlap_counts_as_agreement() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::Destinations, places(&["Delhi", "Agra"]), ExtractionSource::Pattern, 0.9)],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::Destinations, places(&["Delhi", "Agra", "Jaipur"]), ExtractionSource::Statistical, 0.8)],
            ),
        ]);
        assert_eq!(outcome.record.decision(FieldName::Destinations), Some(FusionDecision::Agreement));
        assert_eq!(outcome.record.destinations().len(), 3);
    }

    #[test]
    fn test_preferences_merge_statistical() {
        let tags = |t: &[PreferenceTag]| FieldValue::Tags(t.iter().copied().collect::<BTreeSet<_>>());
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::Preferences, tags(&[PreferenceTag::Honeymoon]), ExtractionSource::Pattern, 0.8)],
            ),
            report(
                ExtractionSource::Statistical,
                vec![candidate(FieldName::Preferences, tags(&[PreferenceTag::Beach]), ExtractionSource::Statistical, 0.7)],
            ),
        ]);
        let prefs = outcome.record.get(FieldName::Preferences).unwrap();
        assert_eq!(prefs.source, ExtractionSource::Statistical);
        assert_eq!(prefs.value, tags(&[PreferenceTag::Honeymoon, PreferenceTag::Beach]));
    }

    #[test]
    fn test_contradiction_reported_and_other_source_used() {
        let outcome = engine().fuse(&[
            report(
                ExtractionSource::Statistical,
                vec![
                    candidate(FieldName::TravelerCount, FieldValue::Integer(2), ExtractionSource::Statistical, 0.9),
                    candidate(FieldName::TravelerCount, FieldValue::Integer(5), ExtractionSource::Statistical, 0.9),
                ],
            ),
            report(
                ExtractionSource::Pattern,
                vec![candidate(FieldName::TravelerCount, FieldValue::Integer(4), ExtractionSource::Pattern, 0.5)],
            ),
        ]);
        assert_eq!(outcome.errors.len(), 1);
        let err = &outcome.errors[0];
        assert_eq!(err.field, FieldName::TravelerCount);
        assert_eq!(err.first, FieldValue::Integer(2));
        assert_eq!(err.second, FieldValue::Integer(5));
        assert_eq!(outcome.record.traveler_count(), Some(4));
        assert_eq!(outcome.record.decision(FieldName::TravelerCount), Some(FusionDecision::SingleSource));
    }

    #[test]
    fn test_repeated_scalar_is_not_contradiction() {
        let outcome = engine().fuse(&[report(
            ExtractionSource::Pattern,
            vec![
                candidate(FieldName::ReferenceId, FieldValue::Text("AB1234".into()), ExtractionSource::Pattern, 0.8),
                candidate(FieldName::ReferenceId, FieldValue::Text("ab1234".into()), ExtractionSource::Pattern, 0.95),
            ],
        )]);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.record.get(FieldName::ReferenceId).unwrap().confidence, 0.95);
    }

    #[test]
    fn test_nothing_in_nothing_out() {
        let outcome = engine().fuse(&[]);
        assert!(outcome.record.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
