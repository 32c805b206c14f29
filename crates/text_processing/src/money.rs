//! Money amounts with Indian magnitude words
//!
//! Recognizes "₹50,000", "Rs. 1.5 lakh", "50k", "2L", "1 crore", "$1200",
//! "5 लाख" and per-person qualifiers. Multiplier words come from the
//! lexicon; amounts without a currency marker default to the configured
//! currency.

use regex::Regex;
use std::collections::BTreeMap;
use travel_inquiry_core::{Money, Span};

use crate::error::{compile, Result};
use crate::text::following;

/// Digit runs this long without grouping are phone numbers, not amounts
const PHONE_DIGITS: usize = 10;

/// One amount found in text
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyMatch {
    pub money: Money,
    pub span: Span,
    pub has_currency: bool,
    pub has_multiplier: bool,
}

#[derive(Debug, Clone)]
pub struct MoneyParser {
    amount: Regex,
    per_person: Regex,
    multipliers: BTreeMap<String, f64>,
    default_currency: String,
}

impl MoneyParser {
    pub fn new(multipliers: &BTreeMap<String, f64>, default_currency: &str) -> Result<Self> {
        let multipliers: BTreeMap<String, f64> = multipliers
            .iter()
            .map(|(word, factor)| (word.to_lowercase(), *factor))
            .collect();

        let mut words: Vec<&String> = multipliers.keys().collect();
        words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
        let mult_alts = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let mult_part = if mult_alts.is_empty() {
            String::new()
        } else {
            format!(r"(?:(?P<mult>{})\b)?", mult_alts)
        };

        let pattern = format!(
            r"(?i)(?:(?P<pre>₹|\$|€|£|\b(?:rs\.?|inr|rupees?|usd|eur|gbp))\s*)?(?P<num>[0-9]{{1,3}}(?:,[0-9]{{2,3}})+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?)\s*{}(?:\s*(?P<post>rupees?\b|rs\b|inr\b|usd\b|dollars?\b|euros?\b|eur\b|gbp\b|/-))?",
            mult_part
        );

        Ok(Self {
            amount: compile(&pattern)?,
            per_person: compile(
                r"(?i)^\s*(?:/-\s*)?(?:per\s+(?:person|head|pax|adult)|pp\b|/\s*(?:person|head|pax)|each\b|प्रति\s+व्यक्ति)",
            )?,
            multipliers,
            default_currency: default_currency.to_string(),
        })
    }

    /// Every numeric amount in the text, in order
    ///
    /// Plain numbers are included; callers decide whether context makes
    /// them money. Phone-like digit runs are skipped.
    pub fn find_all(&self, text: &str) -> Vec<MoneyMatch> {
        let mut found = Vec::new();

        for caps in self.amount.captures_iter(text) {
            let (Some(whole), Some(num)) = (caps.get(0), caps.name("num")) else {
                continue;
            };

            let digits = num.as_str().replace(',', "");
            if !num.as_str().contains(',') && !digits.contains('.') && digits.len() >= PHONE_DIGITS {
                tracing::debug!(value = %digits, "Skipping phone-like number");
                continue;
            }

            let Ok(base) = digits.parse::<f64>() else {
                continue;
            };

            let multiplier = caps
                .name("mult")
                .and_then(|m| self.multipliers.get(&m.as_str().to_lowercase()).copied());

            let marker = caps.name("pre").or_else(|| caps.name("post"));
            let currency = marker
                .and_then(|m| currency_code(m.as_str()))
                .unwrap_or(self.default_currency.as_str());

            let amount = base * multiplier.unwrap_or(1.0);
            let per_person = self.per_person.is_match(following(text, whole.end(), 30));

            found.push(MoneyMatch {
                money: Money::new(amount, currency).per_person(per_person),
                span: Span::new(whole.start(), whole.end()),
                has_currency: marker.is_some(),
                has_multiplier: multiplier.is_some(),
            });
        }

        found
    }

    /// Parse text already known to be a money mention
    ///
    /// Prefers an amount with a currency or multiplier marker, then the
    /// largest plain number.
    pub fn parse_amount(&self, text: &str) -> Option<Money> {
        let matches = self.find_all(text);
        matches
            .iter()
            .find(|m| m.has_currency || m.has_multiplier)
            .or_else(|| {
                matches
                    .iter()
                    .max_by(|a, b| a.money.amount.total_cmp(&b.money.amount))
            })
            .map(|m| m.money.clone())
    }
}

fn currency_code(marker: &str) -> Option<&'static str> {
    let lower = marker.trim().trim_end_matches('.').to_lowercase();
    match lower.as_str() {
        "₹" | "rs" | "inr" | "rupee" | "rupees" | "/-" => Some("INR"),
        "$" | "usd" | "dollar" | "dollars" => Some("USD"),
        "€" | "eur" | "euro" | "euros" => Some("EUR"),
        "£" | "gbp" => Some("GBP"),
        _ => None,
    }
}
