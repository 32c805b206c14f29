//! Budget rules

use regex::Regex;
use travel_inquiry_config::Lexicon;
use travel_inquiry_core::FieldValue;

use super::{Hit, MatchContext, MatchTier};
use crate::error::{compile, Result};
use crate::money::{MoneyMatch, MoneyParser};
use crate::text::preceding;

/// How far before an amount a budget keyword may sit
const KEYWORD_WINDOW: usize = 30;

/// Plain numbers below this are counts or days, never budgets
const MIN_PLAIN_AMOUNT: f64 = 1000.0;

pub(crate) struct BudgetMatcher {
    money: MoneyParser,
    keyword: Regex,
    year_like: Regex,
}

impl BudgetMatcher {
    pub fn new(lexicon: &Lexicon, default_currency: &str) -> Result<Self> {
        Ok(Self {
            money: MoneyParser::new(&lexicon.currency_multipliers, default_currency)?,
            keyword: compile(
                r"(?i)\b(?:budget|under|below|within|upto|up\s+to|around|approx(?:imately)?|max(?:imum)?|cost|spend|price|kharch[ae]?)\b|बजट|खर्च",
            )?,
            year_like: compile(r"^(?:19|20)[0-9]{2}$")?,
        })
    }

    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let amounts = self.money.find_all(ctx.text);
        let keyed = |m: &MoneyMatch| {
            self.keyword
                .is_match(preceding(ctx.text, m.span.start, KEYWORD_WINDOW))
        };
        let marked = |m: &MoneyMatch| m.has_currency || m.has_multiplier;

        let (found, tier) = amounts
            .iter()
            .find(|m| marked(m) && keyed(m))
            .map(|m| (m, MatchTier::Exact))
            .or_else(|| amounts.iter().find(|m| m.has_currency).map(|m| (m, MatchTier::Exact)))
            .or_else(|| amounts.iter().find(|m| m.has_multiplier).map(|m| (m, MatchTier::Fuzzy)))
            .or_else(|| {
                amounts
                    .iter()
                    .find(|m| keyed(m) && self.is_plain_budget(ctx.text, m))
                    .map(|m| (m, MatchTier::Fuzzy))
            })?;

        Some(Hit::new(FieldValue::Money(found.money.clone()), tier, found.span))
    }

    fn is_plain_budget(&self, text: &str, m: &MoneyMatch) -> bool {
        let raw = &text[m.span.start..m.span.end];
        m.money.amount >= MIN_PLAIN_AMOUNT && !self.year_like.is_match(raw.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use travel_inquiry_core::Money;

    fn find(text: &str) -> Option<Hit> {
        let matcher = BudgetMatcher::new(&Lexicon::default(), "INR").unwrap();
        let ctx = MatchContext {
            text,
            hindi: false,
            today: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            prior_reference: None,
        };
        matcher.find(&ctx)
    }

    #[test]
    fn test_keyword_with_multiplier_is_exact() {
        let hit = find("2 people, budget 50k").unwrap();
        assert_eq!(hit.value, FieldValue::Money(Money::inr(50_000.0)));
        assert_eq!(hit.tier, MatchTier::Exact);
    }

    #[test]
    fn test_currency_without_keyword_is_exact() {
        let hit = find("Goa for ₹75,000 total").unwrap();
        assert_eq!(hit.value, FieldValue::Money(Money::inr(75_000.0)));
        assert_eq!(hit.tier, MatchTier::Exact);
    }

    #[test]
    fn test_bare_multiplier_is_fuzzy() {
        let hit = find("Manali 3 nights 60k").unwrap();
        assert_eq!(hit.value, FieldValue::Money(Money::inr(60_000.0)));
        assert_eq!(hit.tier, MatchTier::Fuzzy);
    }

    #[test]
    fn test_keyword_with_plain_number() {
        let hit = find("our budget is 45000 for the trip").unwrap();
        assert_eq!(hit.value, FieldValue::Money(Money::inr(45_000.0)));
        assert_eq!(hit.tier, MatchTier::Fuzzy);
    }

    #[test]
    fn test_counts_and_years_are_not_budgets() {
        assert!(find("2 people for 5 days").is_none());
        assert!(find("budget trip in 2026").is_none());
    }

    #[test]
    fn test_per_person_budget() {
        let hit = find("budget around Rs 30,000 per person").unwrap();
        let money = hit.value.as_money().unwrap();
        assert!(money.per_person);
        assert_eq!(money.amount, 30_000.0);
    }
}
