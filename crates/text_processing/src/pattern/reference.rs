//! Booking reference rules

use regex::Regex;
use travel_inquiry_config::Lexicon;
use travel_inquiry_core::{FieldValue, Span};

use super::{Hit, MatchContext, MatchTier};
use crate::error::{compile, Result};

pub(crate) struct ReferenceMatcher {
    keyed: Regex,
    shape: Regex,
    ownership: Regex,
}

impl ReferenceMatcher {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let shape = &lexicon.booking_id_pattern;
        Ok(Self {
            keyed: compile(&format!(
                r"(?i:\b(?:booking|ref(?:erence)?|pnr|quote|quotation|confirmation|itinerary|reservation|order)\s*(?:id|no\.?|number|code|#)?\s*(?:is|:|-|#)?\s*)(?P<id>{})",
                shape
            ))?,
            shape: compile(shape)?,
            ownership: compile(
                r"(?i)\b(?:my|our)\s+(?:(?:previous|existing|earlier|current|original|last)\s+)?(?:booking|reservation|quote|quotation|itinerary|trip)\b|\b(?:previous|existing|earlier|original)\s+(?:booking|reservation|quote|quotation|itinerary)\b",
            )?,
        })
    }

    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let hint = ctx.prior_reference;
        let confirm = |hit: Hit, id: &str| {
            if hint.is_some_and(|h| h.eq_ignore_ascii_case(id)) {
                hit.confirmed()
            } else {
                hit
            }
        };

        if let Some(id) = self.keyed.captures(ctx.text).and_then(|c| c.name("id")) {
            let hit = Hit::new(
                FieldValue::Text(id.as_str().to_string()),
                MatchTier::Exact,
                Span::new(id.start(), id.end()),
            );
            return Some(confirm(hit, id.as_str()));
        }

        if let Some(id) = self.shape.find(ctx.text) {
            let matches_hint = hint.is_some_and(|h| h.eq_ignore_ascii_case(id.as_str()));
            if matches_hint || self.ownership.is_match(ctx.text) {
                let tier = if matches_hint { MatchTier::Exact } else { MatchTier::Fuzzy };
                let hit = Hit::new(
                    FieldValue::Text(id.as_str().to_string()),
                    tier,
                    Span::new(id.start(), id.end()),
                );
                return Some(confirm(hit, id.as_str()));
            }
        }

        match hint {
            Some(hint) if self.ownership.is_match(ctx.text) => Some(Hit::unanchored(
                FieldValue::Text(hint.to_string()),
                MatchTier::Inferred,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn find(text: &str, hint: Option<&str>) -> Option<Hit> {
        let matcher = ReferenceMatcher::new(&Lexicon::default()).unwrap();
        let ctx = MatchContext {
            text,
            hindi: false,
            today: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            prior_reference: hint,
        };
        matcher.find(&ctx)
    }

    #[test]
    fn test_keyed_reference() {
        let hit = find("please modify my booking ref AB1234, add one more traveler", None).unwrap();
        assert_eq!(hit.value, FieldValue::Text("AB1234".into()));
        assert_eq!(hit.tier, MatchTier::Exact);
        assert!(!hit.confirmed);

        let hit = find("Booking ID: TRV-20391 needs new dates", None).unwrap();
        assert_eq!(hit.value, FieldValue::Text("TRV-20391".into()));
    }

    #[test]
    fn test_hint_confirms() {
        let hit = find("PNR AB1234 dates change", Some("ab1234")).unwrap();
        assert!(hit.confirmed);
    }

    #[test]
    fn test_shape_needs_context() {
        assert!(find("flight AI202 is fine", None).is_none());
        let hit = find("AI202 was our previous booking", None).unwrap();
        assert_eq!(hit.tier, MatchTier::Fuzzy);
    }

    #[test]
    fn test_hint_fallback() {
        let hit = find("Please update my previous booking", Some("GT5521")).unwrap();
        assert_eq!(hit.value, FieldValue::Text("GT5521".into()));
        assert_eq!(hit.tier, MatchTier::Inferred);
        assert!(hit.span.is_none());

        assert!(find("Please update my previous booking", None).is_none());
    }
}
