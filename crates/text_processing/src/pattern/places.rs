//! Destination and departure rules
//!
//! Destinations come from the gazetteer in mention order. A departure city
//! is found first and left out of the destinations.

use regex::Regex;
use std::collections::HashMap;
use travel_inquiry_config::Lexicon;
use travel_inquiry_core::{FieldValue, Span};

use super::{Hit, MatchContext, MatchTier};
use crate::error::{compile, Result};
use crate::text::following;

/// Capitalized words that follow "trip to" but are not places
const NOT_PLACES: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday", "The", "My", "Our", "Your", "This", "Next", "India",
];

struct PlaceName {
    canonical: String,
    alias: bool,
}

struct PlaceMention {
    canonical: String,
    alias: bool,
    span: Span,
}

pub(crate) struct PlaceMatcher {
    gazetteer: Option<Regex>,
    names: HashMap<String, PlaceName>,
    strong_cue: Regex,
    from_cue: Regex,
    leg_join: Regex,
    hindi_from: Regex,
    capitalized: Regex,
    trip_to: Regex,
}

impl PlaceMatcher {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let mut names = HashMap::new();
        for entry in &lexicon.gazetteer {
            names.insert(
                entry.name.to_lowercase(),
                PlaceName {
                    canonical: entry.name.clone(),
                    alias: false,
                },
            );
            for alias in &entry.aliases {
                names.entry(alias.to_lowercase()).or_insert(PlaceName {
                    canonical: entry.name.clone(),
                    alias: true,
                });
            }
        }

        let mut spellings: Vec<&String> = names.keys().collect();
        spellings.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        let gazetteer = if spellings.is_empty() {
            None
        } else {
            let alternation = spellings
                .iter()
                .map(|s| regex::escape(s).replace(' ', r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!(r"(?i)\b(?:{})\b", alternation))?)
        };

        Ok(Self {
            gazetteer,
            names,
            strong_cue: compile(
                r"(?i)\b(?:departing|departure|starting|leaving|flying|travell?ing|coming|start)\s+(?:from|ex)\s+",
            )?,
            from_cue: compile(r"(?i)\b(?:from|ex)\s+")?,
            leg_join: compile(r"^\s*(?:to\b|-|–|→|>)")?,
            hindi_from: compile(r"^\s*(?:se\b|से)")?,
            capitalized: compile(r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?")?,
            trip_to: compile(
                r"(?i:\b(?:trip\s+to|visit(?:ing)?|going\s+to|travel(?:l?ing)?\s+to|holiday\s+(?:in|to)|vacation\s+(?:in|to)|tour\s+(?:of|to)|package\s+(?:for|to))\s+)(?P<place>[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            )?,
        })
    }

    /// Departure city: explicit cue, "from X to", Hindi "X se", bare "from X"
    pub fn departure(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let text = ctx.text;

        for cue in self.strong_cue.find_iter(text) {
            if let Some(place) = self.place_at(text, cue.end()) {
                return Some(Hit::new(
                    FieldValue::Text(place.canonical),
                    MatchTier::Exact,
                    Span::new(cue.start(), place.span.end),
                ));
            }
            if let Some(word) = self.capitalized.find(&text[cue.end()..]) {
                let end = cue.end() + word.end();
                return Some(Hit::new(
                    FieldValue::Text(word.as_str().to_string()),
                    MatchTier::Fuzzy,
                    Span::new(cue.start(), end),
                ));
            }
        }

        for cue in self.from_cue.find_iter(text) {
            if let Some(place) = self.place_at(text, cue.end()) {
                if self.leg_join.is_match(following(text, place.span.end, 8)) {
                    return Some(Hit::new(
                        FieldValue::Text(place.canonical),
                        MatchTier::Exact,
                        Span::new(cue.start(), place.span.end),
                    ));
                }
            }
        }

        if ctx.hindi {
            let mention = self
                .mentions(text)
                .into_iter()
                .find(|m| self.hindi_from.is_match(following(text, m.span.end, 8)));
            if let Some(mention) = mention {
                return Some(Hit::new(FieldValue::Text(mention.canonical), MatchTier::Fuzzy, mention.span));
            }
        }

        self.from_cue.find_iter(text).find_map(|cue| {
            let place = self.place_at(text, cue.end())?;
            Some(Hit::new(
                FieldValue::Text(place.canonical),
                MatchTier::Fuzzy,
                Span::new(cue.start(), place.span.end),
            ))
        })
    }

    /// Destinations in first-mention order, without the departure city
    pub fn destinations(&self, ctx: &MatchContext<'_>, departure: Option<&str>) -> Option<Hit> {
        let mut places: Vec<String> = Vec::new();
        let mut span: Option<Span> = None;
        let mut any_alias = false;

        for mention in self.mentions(ctx.text) {
            if departure.is_some_and(|d| d.eq_ignore_ascii_case(&mention.canonical)) {
                continue;
            }
            if places.iter().any(|p| p.eq_ignore_ascii_case(&mention.canonical)) {
                continue;
            }
            any_alias |= mention.alias;
            span = Some(span.map_or(mention.span, |s| s.cover(mention.span)));
            places.push(mention.canonical);
        }

        if let Some(span) = span {
            let tier = if any_alias { MatchTier::Fuzzy } else { MatchTier::Exact };
            return Some(Hit::new(FieldValue::Places(places), tier, span));
        }

        self.trip_to.captures_iter(ctx.text).find_map(|caps| {
            let place = caps.name("place")?;
            let first_word = place.as_str().split_whitespace().next()?;
            if NOT_PLACES.contains(&first_word) {
                return None;
            }
            if departure.is_some_and(|d| d.eq_ignore_ascii_case(place.as_str())) {
                return None;
            }
            Some(Hit::new(
                FieldValue::Places(vec![place.as_str().to_string()]),
                MatchTier::Inferred,
                Span::new(place.start(), place.end()),
            ))
        })
    }

    fn mentions(&self, text: &str) -> Vec<PlaceMention> {
        let Some(gazetteer) = &self.gazetteer else {
            return Vec::new();
        };
        gazetteer
            .find_iter(text)
            .filter_map(|m| self.mention(m.as_str(), Span::new(m.start(), m.end())))
            .collect()
    }

    /// Gazetteer place starting exactly at `pos`
    fn place_at(&self, text: &str, pos: usize) -> Option<PlaceMention> {
        let m = self.gazetteer.as_ref()?.find_at(text, pos)?;
        if m.start() != pos {
            return None;
        }
        self.mention(m.as_str(), Span::new(m.start(), m.end()))
    }

    fn mention(&self, spelling: &str, span: Span) -> Option<PlaceMention> {
        let key = spelling.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let name = self.names.get(&key)?;
        Some(PlaceMention {
            canonical: name.canonical.clone(),
            alias: name.alias,
            span,
        })
    }
}
