//! Statistical extractor
//!
//! Bridges an [`EntityModel`] to the [`Extractor`] trait: runs the model
//! under a timeout, drops spans below the confidence floor and maps each
//! entity label onto the field catalog.
//!
//! | Label        | Field                                   |
//! |--------------|-----------------------------------------|
//! | person       | traveler_count (number, or named heads) |
//! | money        | budget                                  |
//! | date         | travel_dates                            |
//! | place        | destinations, or departure_city after "from"/"se" |
//! | preference   | preferences                             |
//! | request      | special_requests                        |
//! | reference    | reference_id                            |
//! | organization | discarded                               |
//!
//! An unavailable or slow model yields a degraded, empty report; it never
//! fails the message.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDate;

use travel_inquiry_config::{Lexicon, PatternConfig, StatisticalConfig};
use travel_inquiry_core::{
    merge_unique_ci, DateRange, EntityLabel, EntityModel, EntitySpan, ExtractedField,
    ExtractionReport, ExtractionSource, Extractor, FieldName, FieldValue, LanguageProfile,
    NormalizedText, PreferenceTag, Span,
};
use travel_inquiry_text_processing::numbers::parse_count;
use travel_inquiry_text_processing::{DateParser, MoneyParser};

/// Words that describe a group rather than name a person
const GROUP_WORDS: &[&str] = &[
    "family", "group", "friends", "couple", "kids", "children", "adults", "people", "parivar",
    "log", "we", "us",
];

/// Words marking a child count that adds to the adult count
const CHILD_WORDS: &[&str] = &["child", "children", "kid", "kids", "infant", "bachche", "bacche", "बच्चे"];

/// A span found in the normalized text
#[derive(Debug, Clone)]
struct Located {
    text: String,
    score: f32,
    span: Option<Span>,
}

/// Statistical extractor backed by a shared entity model
pub struct StatisticalExtractor {
    model: Arc<dyn EntityModel>,
    confidence_floor: f32,
    timeout: Duration,
    lexicon: Lexicon,
    money: MoneyParser,
    dates: DateParser,
}

impl StatisticalExtractor {
    pub fn new(
        model: Arc<dyn EntityModel>,
        config: &StatisticalConfig,
        pattern: &PatternConfig,
        lexicon: &Lexicon,
    ) -> travel_inquiry_core::Result<Self> {
        Ok(Self {
            model,
            confidence_floor: config.confidence_floor,
            timeout: Duration::from_millis(config.timeout_ms),
            lexicon: lexicon.clone(),
            money: MoneyParser::new(&lexicon.currency_multipliers, &pattern.default_currency)?,
            dates: DateParser::new()?,
        })
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Map recognized spans onto catalog fields
    ///
    /// Yields at most one candidate per field.
    pub fn map_spans(&self, text: &NormalizedText, spans: Vec<EntitySpan>) -> Vec<ExtractedField> {
        let reference = text.reference_date;

        let mut by_label: Vec<(EntityLabel, Located)> = Vec::new();
        let mut cursor = 0;
        for span in spans {
            if !span.score.is_finite() || span.score < self.confidence_floor {
                tracing::debug!(label = ?span.label, text = %span.text, score = span.score, "Discarding low-confidence span");
                continue;
            }
            if span.label == EntityLabel::Organization {
                tracing::debug!(text = %span.text, "Discarding organization span");
                continue;
            }
            let located = locate(text.as_str(), &span, &mut cursor);
            by_label.push((span.label, located));
        }

        let of = |label: EntityLabel| labelled(&by_label, label);

        let (departures, destinations): (Vec<&Located>, Vec<&Located>) = of(EntityLabel::Place)
            .into_iter()
            .partition(|place| is_departure(text.as_str(), place));

        let fields = [
            self.traveler_count(&of(EntityLabel::Person)),
            self.budget(&of(EntityLabel::Money)),
            self.destinations(&destinations),
            self.departure(&departures),
            self.travel_dates(&of(EntityLabel::Date), reference),
            self.preferences(&of(EntityLabel::Preference)),
            requests(&of(EntityLabel::Request)),
            reference_id(&of(EntityLabel::Reference)),
        ];

        fields.into_iter().flatten().collect()
    }

    fn traveler_count(&self, spans: &[&Located]) -> Option<ExtractedField> {
        let counted: Vec<(u32, &Located)> = spans
            .iter()
            .filter_map(|s| count_in(&s.text).map(|n| (n, *s)))
            .collect();

        if !counted.is_empty() {
            let has_children = counted.iter().any(|(_, s)| mentions_any(&s.text, CHILD_WORDS));
            let (count, used): (u32, Vec<&Located>) = if has_children && counted.len() > 1 {
                (counted.iter().map(|(n, _)| n).sum(), counted.iter().map(|(_, s)| *s).collect())
            } else {
                let (n, best) = counted
                    .iter()
                    .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
                    .copied()?;
                (n, vec![best])
            };
            return (count >= 1).then(|| candidate(FieldName::TravelerCount, FieldValue::Integer(count), &used));
        }

        let mut names: Vec<String> = Vec::new();
        let mut used = Vec::new();
        for span in spans {
            if is_named_person(&span.text) {
                let before = names.len();
                merge_unique_ci(&mut names, [span.text.as_str()]);
                if names.len() > before {
                    used.push(*span);
                }
            }
        }
        let count = u32::try_from(names.len()).ok().filter(|n| *n > 0)?;
        Some(candidate(FieldName::TravelerCount, FieldValue::Integer(count), &used))
    }

    fn budget(&self, spans: &[&Located]) -> Option<ExtractedField> {
        spans
            .iter()
            .filter_map(|s| self.money.parse_amount(&s.text).map(|m| (m, *s)))
            .filter(|(m, _)| m.amount > 0.0)
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(money, span)| candidate(FieldName::Budget, FieldValue::Money(money), &[span]))
    }

    fn destinations(&self, spans: &[&Located]) -> Option<ExtractedField> {
        let mut places = Vec::new();
        for span in spans {
            merge_unique_ci(&mut places, [self.canonical(&span.text)]);
        }
        (!places.is_empty()).then(|| candidate(FieldName::Destinations, FieldValue::Places(places), spans))
    }

    fn departure(&self, spans: &[&Located]) -> Option<ExtractedField> {
        let best = spans.iter().max_by(|a, b| a.score.total_cmp(&b.score))?;
        Some(candidate(
            FieldName::DepartureCity,
            FieldValue::Text(self.canonical(&best.text)),
            &[*best],
        ))
    }

    fn travel_dates(&self, spans: &[&Located], reference: NaiveDate) -> Option<ExtractedField> {
        let parsed: Vec<(DateRange, &Located)> = spans
            .iter()
            .filter_map(|s| self.dates.parse(&s.text, reference).map(|r| (r, *s)))
            .collect();

        let anchored = parsed.iter().find(|(r, _)| r.start.is_some());
        let length = parsed
            .iter()
            .find(|(r, _)| r.start.is_none() && r.duration_days.is_some());

        let (range, used) = match (anchored, length) {
            (Some((start, a)), Some((len, b))) if start.duration_days.is_none() => {
                let days = len.duration_days.unwrap_or_default();
                (start.clone().with_duration(days), vec![*a, *b])
            },
            (Some((start, a)), _) => (start.clone(), vec![*a]),
            (None, Some((len, b))) => (len.clone(), vec![*b]),
            (None, None) => return None,
        };
        Some(candidate(FieldName::TravelDates, FieldValue::DateRange(range), &used))
    }

    fn preferences(&self, spans: &[&Located]) -> Option<ExtractedField> {
        let mut tags = BTreeSet::new();
        let mut used = Vec::new();
        for span in spans {
            if let Some(tag) = PreferenceTag::parse(&span.text).or_else(|| self.keyword_tag(&span.text)) {
                tags.insert(tag);
                used.push(*span);
            }
        }
        (!tags.is_empty()).then(|| candidate(FieldName::Preferences, FieldValue::Tags(tags), &used))
    }

    fn keyword_tag(&self, text: &str) -> Option<PreferenceTag> {
        let lower = text.to_lowercase();
        self.lexicon
            .preference_keywords
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
            .map(|(tag, _)| *tag)
    }

    fn canonical(&self, spelling: &str) -> String {
        let trimmed = spelling.trim();
        self.lexicon
            .canonical_place(trimmed)
            .unwrap_or(trimmed)
            .to_string()
    }
}

fn labelled(spans: &[(EntityLabel, Located)], label: EntityLabel) -> Vec<&Located> {
    spans.iter().filter(|(l, _)| *l == label).map(|(_, s)| s).collect()
}

fn requests(spans: &[&Located]) -> Option<ExtractedField> {
    let mut items = Vec::new();
    merge_unique_ci(&mut items, spans.iter().map(|s| s.text.as_str()));
    (!items.is_empty()).then(|| candidate(FieldName::SpecialRequests, FieldValue::Requests(items), spans))
}

fn reference_id(spans: &[&Located]) -> Option<ExtractedField> {
    let best = spans.iter().max_by(|a, b| a.score.total_cmp(&b.score))?;
    Some(candidate(
        FieldName::ReferenceId,
        FieldValue::Text(best.text.trim().to_string()),
        &[*best],
    ))
}

/// Candidate scored by the mean of its contributing spans
fn candidate(field: FieldName, value: FieldValue, used: &[&Located]) -> ExtractedField {
    let confidence = if used.is_empty() {
        0.0
    } else {
        used.iter().map(|s| s.score).sum::<f32>() / used.len() as f32
    };
    let span = used.iter().filter_map(|s| s.span).reduce(Span::cover);

    tracing::debug!(field = %field, value = %value, confidence, "Statistical match");

    let field = ExtractedField::new(field, value, ExtractionSource::Statistical, confidence);
    match span {
        Some(span) => field.with_span(span),
        None => field,
    }
}

/// Resolve a span's byte offsets in the text
///
/// Reported offsets are kept when they land on char boundaries and cover
/// the span text; otherwise the text is searched from the last match on,
/// then from the start. Unfound spans stay unanchored.
fn locate(text: &str, span: &EntitySpan, cursor: &mut usize) -> Located {
    let needle = span.text.trim();
    let reported = match (span.start, span.end) {
        (Some(start), Some(end)) => text
            .get(start..end)
            .filter(|slice| slice.trim().eq_ignore_ascii_case(needle))
            .map(|_| Span::new(start, end)),
        _ => None,
    };

    let found = reported.or_else(|| {
        let from = text.get(*cursor..).and_then(|rest| rest.find(needle)).map(|i| i + *cursor);
        from.or_else(|| text.find(needle))
            .map(|start| Span::new(start, start + needle.len()))
    });

    if let Some(found) = found {
        *cursor = found.end;
    }

    Located {
        text: needle.to_string(),
        score: span.score,
        span: found,
    }
}

/// Place preceded by "from" or followed by Hindi "se"
fn is_departure(text: &str, place: &Located) -> bool {
    let Some(span) = place.span else {
        return false;
    };
    let before = text.get(..span.start).unwrap_or_default().trim_end().to_lowercase();
    let after = text.get(span.end..).unwrap_or_default().trim_start().to_lowercase();

    let from_before = before
        .rsplit(|c: char| !c.is_alphanumeric())
        .next()
        .is_some_and(|word| word == "from");
    let se_after = after
        .split(|c: char| !c.is_alphanumeric() && c != '\u{0947}')
        .next()
        .is_some_and(|word| word == "se" || word == "से");
    from_before || se_after
}

/// First count in a person span, ignoring articles
fn count_in(text: &str) -> Option<u32> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '-' | '+'))
        .filter(|token| !matches!(token.to_lowercase().as_str(), "a" | "an" | "single"))
        .find_map(parse_count)
}

fn mentions_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric() && !('\u{0900}'..='\u{097F}').contains(&c))
        .any(|token| words.contains(&token))
}

/// Capitalized span that is not a group word
fn is_named_person(text: &str) -> bool {
    let starts_upper = text.chars().next().is_some_and(char::is_uppercase);
    starts_upper && !mentions_any(text, GROUP_WORDS)
}

#[async_trait]
impl Extractor for StatisticalExtractor {
    async fn extract(&self, text: &NormalizedText, _profile: &LanguageProfile) -> ExtractionReport {
        if text.is_empty() {
            return ExtractionReport::new(self.name(), self.source(), Vec::new());
        }

        let spans = match tokio::time::timeout(self.timeout, self.model.recognize(text.as_str())).await {
            Ok(Ok(spans)) => spans,
            Ok(Err(e)) => {
                tracing::warn!(model = %self.model.model_name(), error = %e, "Statistical extraction unavailable");
                return ExtractionReport::degraded(self.name(), self.source(), e.to_string());
            },
            Err(_) => {
                tracing::warn!(
                    model = %self.model.model_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Statistical extraction timed out"
                );
                return ExtractionReport::degraded(
                    self.name(),
                    self.source(),
                    format!("timed out after {}ms", self.timeout.as_millis()),
                );
            },
        };

        let candidates = self.map_spans(text, spans);
        tracing::debug!(candidates = candidates.len(), "Statistical extraction complete");
        ExtractionReport::new(self.name(), self.source(), candidates)
    }

    fn source(&self) -> ExtractionSource {
        ExtractionSource::Statistical
    }

    fn name(&self) -> &str {
        "statistical"
    }
}
