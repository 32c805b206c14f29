//! Rule-based field extraction
//!
//! Every field has an ordered list of matchers; the first one that fires
//! wins for that field, so the extractor yields at most one candidate per
//! field. Confidence is fixed per matcher tier:
//!
//! | Tier     | Meaning                                         |
//! |----------|-------------------------------------------------|
//! | Exact    | structured match ("2 people", "₹50,000")        |
//! | Fuzzy    | lexicon or alias match ("couple", "Bombay")     |
//! | Inferred | default from context ("family" means 4 people)  |
//!
//! Rules that depend on Hindi word order ("2 log", "Delhi se") only run
//! when the language profile says Hindi is present or is unsure.

mod budget;
mod places;
mod preferences;
mod reference;
mod requirements;
mod travelers;

use async_trait::async_trait;
use chrono::NaiveDate;
use travel_inquiry_config::{Lexicon, PatternConfig};
use travel_inquiry_core::{
    DateRange, ExtractedField, ExtractionReport, ExtractionSource, Extractor, FieldName,
    FieldValue, LanguageProfile, NormalizedText, Span,
};

use crate::dates::{DateMatch, DateParser};
use crate::error::Result;
use budget::BudgetMatcher;
use places::PlaceMatcher;
use preferences::{PreferenceMatcher, RequestMatcher};
use reference::ReferenceMatcher;
use travelers::TravelerMatcher;

/// Below this language confidence, Hindi rules run regardless of language
const HINDI_RULES_CONFIDENCE: f32 = 0.5;

/// Matcher tier, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Fuzzy,
    Inferred,
}

/// A single matcher result before it becomes a candidate
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hit {
    pub value: FieldValue,
    pub tier: MatchTier,
    pub span: Option<Span>,
    /// Confirmed by an independent hint such as the thread's prior reference
    pub confirmed: bool,
}

impl Hit {
    pub fn new(value: FieldValue, tier: MatchTier, span: Span) -> Self {
        Self {
            value,
            tier,
            span: Some(span),
            confirmed: false,
        }
    }

    pub fn unanchored(value: FieldValue, tier: MatchTier) -> Self {
        Self {
            value,
            tier,
            span: None,
            confirmed: false,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }
}

/// What every matcher sees
#[derive(Debug, Clone, Copy)]
pub(crate) struct MatchContext<'a> {
    pub text: &'a str,
    pub hindi: bool,
    pub today: NaiveDate,
    pub prior_reference: Option<&'a str>,
}

/// Pattern extractor
pub struct PatternExtractor {
    config: PatternConfig,
    travelers: TravelerMatcher,
    budget: BudgetMatcher,
    places: PlaceMatcher,
    dates: DateParser,
    preferences: PreferenceMatcher,
    requests: RequestMatcher,
    reference: ReferenceMatcher,
}

impl PatternExtractor {
    pub fn new(config: &PatternConfig, lexicon: &Lexicon) -> Result<Self> {
        Ok(Self {
            travelers: TravelerMatcher::new(config.family_default_size)?,
            budget: BudgetMatcher::new(lexicon, &config.default_currency)?,
            places: PlaceMatcher::new(lexicon)?,
            dates: DateParser::new()?,
            preferences: PreferenceMatcher::new(lexicon)?,
            requests: RequestMatcher::new(lexicon)?,
            reference: ReferenceMatcher::new(lexicon)?,
            config: config.clone(),
        })
    }

    pub fn confidence(&self, tier: MatchTier) -> f32 {
        match tier {
            MatchTier::Exact => self.config.exact_confidence,
            MatchTier::Fuzzy => self.config.fuzzy_confidence,
            MatchTier::Inferred => self.config.inferred_confidence,
        }
    }

    /// Run every field's matchers; at most one candidate per field
    pub fn extract_fields(&self, text: &NormalizedText, profile: &LanguageProfile) -> Vec<ExtractedField> {
        if text.is_empty() {
            return Vec::new();
        }

        let ctx = MatchContext {
            text: text.as_str(),
            hindi: profile.primary_language.uses_hindi() || profile.confidence < HINDI_RULES_CONFIDENCE,
            today: text.reference_date,
            prior_reference: text.prior_reference.as_deref(),
        };

        let departure = self.places.departure(&ctx);
        let departure_name = departure
            .as_ref()
            .and_then(|hit| hit.value.as_text())
            .map(str::to_string);

        let hits = [
            (FieldName::TravelerCount, self.travelers.find(&ctx)),
            (FieldName::Budget, self.budget.find(&ctx)),
            (FieldName::Destinations, self.places.destinations(&ctx, departure_name.as_deref())),
            (FieldName::DepartureCity, departure),
            (FieldName::TravelDates, self.travel_dates(&ctx)),
            (FieldName::Preferences, self.preferences.find(&ctx)),
            (FieldName::SpecialRequests, self.requests.find(&ctx)),
            (FieldName::ReferenceId, self.reference.find(&ctx)),
        ];

        hits.into_iter()
            .filter_map(|(field, hit)| hit.map(|hit| self.candidate(field, hit)))
            .collect()
    }

    fn candidate(&self, field: FieldName, hit: Hit) -> ExtractedField {
        let base = self.confidence(hit.tier);
        let confidence = if hit.confirmed { base + (1.0 - base) / 2.0 } else { base };

        tracing::debug!(
            field = %field,
            value = %hit.value,
            tier = ?hit.tier,
            confidence,
            "Pattern match"
        );

        let candidate = ExtractedField::new(field, hit.value, ExtractionSource::Pattern, confidence);
        match hit.span {
            Some(span) => candidate.with_span(span),
            None => candidate,
        }
    }

    fn travel_dates(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        if let Some(range) = self.dates.explicit_range(ctx.text, ctx.today) {
            return Some(Hit::new(FieldValue::DateRange(range.range), MatchTier::Exact, range.span));
        }

        let duration = self.dates.duration(ctx.text);
        let with_duration = |start: DateMatch| match duration {
            Some(d) => (start.range.with_duration(d.days), start.span.cover(d.span)),
            None => (start.range, start.span),
        };

        if let Some(anchor) = self.dates.start_anchor(ctx.text, ctx.today) {
            let (range, span) = with_duration(anchor);
            return Some(Hit::new(FieldValue::DateRange(range), MatchTier::Exact, span));
        }

        if let Some(relative) = self.dates.relative(ctx.text, ctx.today) {
            let (range, span) = with_duration(relative);
            return Some(Hit::new(FieldValue::DateRange(range), MatchTier::Fuzzy, span));
        }

        duration.map(|d| {
            let tier = if d.numeric { MatchTier::Exact } else { MatchTier::Fuzzy };
            Hit::new(FieldValue::DateRange(DateRange::duration(d.days)), tier, d.span)
        })
    }
}

#[async_trait]
impl Extractor for PatternExtractor {
    async fn extract(&self, text: &NormalizedText, profile: &LanguageProfile) -> ExtractionReport {
        let candidates = self.extract_fields(text, profile);
        tracing::debug!(candidates = candidates.len(), "Pattern extraction complete");
        ExtractionReport::new(self.name(), self.source(), candidates)
    }

    fn source(&self) -> ExtractionSource {
        ExtractionSource::Pattern
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use travel_inquiry_core::{Money, PreferenceTag, PrimaryLanguage, RawMessage};

    use crate::{LanguageIdentifier, Normalizer};

    fn extractor() -> PatternExtractor {
        PatternExtractor::new(&PatternConfig::default(), &Lexicon::default()).unwrap()
    }

    fn run(body: &str) -> Vec<ExtractedField> {
        let received = Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap();
        let message = RawMessage::new(body).with_received_at(received);
        let text = Normalizer::new().normalize(&message);
        let profile = LanguageIdentifier::new(&Default::default()).identify(text.as_str());
        extractor().extract_fields(&text, &profile)
    }

    fn value(fields: &[ExtractedField], name: FieldName) -> Option<&FieldValue> {
        fields.iter().find(|f| f.field == name).map(|f| &f.value)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_simple_english_inquiry() {
        let fields = run("2 people, Goa trip for 5 days, budget 50k");
        assert_eq!(value(&fields, FieldName::TravelerCount), Some(&FieldValue::Integer(2)));
        assert_eq!(
            value(&fields, FieldName::Destinations),
            Some(&FieldValue::Places(vec!["Goa".into()]))
        );
        assert_eq!(value(&fields, FieldName::Budget), Some(&FieldValue::Money(Money::inr(50_000.0))));
        assert_eq!(
            value(&fields, FieldName::TravelDates),
            Some(&FieldValue::DateRange(DateRange::duration(5)))
        );
        assert!(value(&fields, FieldName::ReferenceId).is_none());
    }

    #[test]
    fn test_one_candidate_per_field() {
        let fields = run("Family of 4 from Mumbai to Goa and Kerala, 10-15 May, budget ₹1.5 lakh, beach and luxury");
        for name in FieldName::ALL {
            assert!(fields.iter().filter(|f| f.field == name).count() <= 1);
        }
        assert!(fields.iter().all(|f| f.source == ExtractionSource::Pattern));
    }

    #[test]
    fn test_multi_leg_order_and_departure() {
        let fields = run("Family of 4 from Mumbai to Goa and Kerala, 10-15 May");
        assert_eq!(
            value(&fields, FieldName::Destinations),
            Some(&FieldValue::Places(vec!["Goa".into(), "Kerala".into()]))
        );
        assert_eq!(
            value(&fields, FieldName::DepartureCity),
            Some(&FieldValue::Text("Mumbai".into()))
        );
        assert_eq!(
            value(&fields, FieldName::TravelDates),
            Some(&FieldValue::DateRange(DateRange::between(ymd(2026, 5, 10), ymd(2026, 5, 15))))
        );
    }

    #[test]
    fn test_family_and_honeymoon_inquiry() {
        let fields = run("Delhi-Agra-Jaipur for family of 4, honeymoon package, 8 days");
        assert_eq!(
            value(&fields, FieldName::Destinations),
            Some(&FieldValue::Places(vec!["Delhi".into(), "Agra".into(), "Jaipur".into()]))
        );
        assert_eq!(value(&fields, FieldName::TravelerCount), Some(&FieldValue::Integer(4)));
        let tags = value(&fields, FieldName::Preferences).and_then(|v| v.as_tags()).unwrap();
        assert!(tags.contains(&PreferenceTag::Honeymoon));
    }

    #[test]
    fn test_modification_reference() {
        let fields = run("please modify my booking ref AB1234, add one more traveler");
        assert_eq!(
            value(&fields, FieldName::ReferenceId),
            Some(&FieldValue::Text("AB1234".into()))
        );
        let reference = fields.iter().find(|f| f.field == FieldName::ReferenceId).unwrap();
        assert_eq!(reference.confidence, PatternConfig::default().exact_confidence);
        assert!(value(&fields, FieldName::Destinations).is_none());
    }

    #[test]
    fn test_hinglish_counts() {
        let fields = run("Hamare client ke liye Goa ka package chahiye, 2 log, 5 din, budget 40 hazar");
        assert_eq!(value(&fields, FieldName::TravelerCount), Some(&FieldValue::Integer(2)));
        assert_eq!(value(&fields, FieldName::Budget), Some(&FieldValue::Money(Money::inr(40_000.0))));
        assert_eq!(
            value(&fields, FieldName::TravelDates),
            Some(&FieldValue::DateRange(DateRange::duration(5)))
        );
    }

    #[test]
    fn test_devanagari_inquiry() {
        let fields = run("हमें गोवा जाना है, दो लोग, पांच दिन, बजट 50 हजार");
        assert_eq!(value(&fields, FieldName::TravelerCount), Some(&FieldValue::Integer(2)));
        assert_eq!(
            value(&fields, FieldName::Destinations),
            Some(&FieldValue::Places(vec!["Goa".into()]))
        );
        assert_eq!(value(&fields, FieldName::Budget), Some(&FieldValue::Money(Money::inr(50_000.0))));
    }

    #[test]
    fn test_hindi_rules_gated_for_confident_english() {
        let extractor = extractor();
        let text = NormalizedText::new("Delhi se Goa");
        let english = LanguageProfile::new(PrimaryLanguage::English, 0.0, 0.9);
        let hinglish = LanguageProfile::new(PrimaryLanguage::Hinglish, 0.3, 0.9);

        let find_departure = |profile: &LanguageProfile| {
            extractor
                .extract_fields(&text, profile)
                .into_iter()
                .find(|f| f.field == FieldName::DepartureCity)
        };
        assert!(find_departure(&english).is_none());
        assert_eq!(
            find_departure(&hinglish).map(|f| f.value),
            Some(FieldValue::Text("Delhi".into()))
        );
    }

    #[test]
    fn test_relative_date_uses_received_at() {
        let fields = run("Goa next month for 4 nights");
        let range = value(&fields, FieldName::TravelDates)
            .and_then(|v| v.as_date_range())
            .unwrap();
        assert_eq!(range.start, Some(ymd(2026, 4, 1)));
        assert_eq!(range.duration_days, Some(5));
        let dates = fields.iter().find(|f| f.field == FieldName::TravelDates).unwrap();
        assert_eq!(dates.confidence, PatternConfig::default().fuzzy_confidence);
    }

    #[test]
    fn test_relative_date_uses_pinned_clock_without_received_at() {
        let text = Normalizer::new()
            .with_reference_date(ymd(2025, 12, 20))
            .normalize(&RawMessage::new("Goa next month for 4 nights"));
        let profile = LanguageIdentifier::new(&Default::default()).identify(text.as_str());
        let fields = extractor().extract_fields(&text, &profile);
        let range = value(&fields, FieldName::TravelDates)
            .and_then(|v| v.as_date_range())
            .unwrap();
        assert_eq!(range.start, Some(ymd(2026, 1, 1)));
    }

    #[test]
    fn test_tier_ordering() {
        let config = PatternConfig::default();
        let fields = run("We are a family going to Goa");
        let travelers = fields.iter().find(|f| f.field == FieldName::TravelerCount).unwrap();
        assert_eq!(travelers.value, FieldValue::Integer(config.family_default_size));
        assert_eq!(travelers.confidence, config.inferred_confidence);
    }

    #[test]
    fn test_spans_point_into_text() {
        let body = "Need a Goa trip, budget ₹45,000";
        let fields = run(body);
        let budget = fields.iter().find(|f| f.field == FieldName::Budget).unwrap();
        let span = budget.span.unwrap();
        assert_eq!(&body[span.start..span.end], "₹45,000");
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(run("").is_empty());
        assert!(run("@@@ ###").is_empty());
    }

    #[tokio::test]
    async fn test_extractor_trait() {
        let extractor = extractor();
        let text = NormalizedText::new("3 adults and 2 kids to Manali");
        let report = extractor.extract(&text, &LanguageProfile::default()).await;
        assert_eq!(report.extractor, "pattern");
        assert!(!report.is_degraded());
        let travelers = report
            .candidates
            .iter()
            .find(|f| f.field == FieldName::TravelerCount)
            .unwrap();
        assert_eq!(travelers.value, FieldValue::Integer(5));
    }
}
