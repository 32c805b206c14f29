//! Preference tags and special requests

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use travel_inquiry_config::Lexicon;
use travel_inquiry_core::{merge_unique_ci, FieldValue, PreferenceTag, Span};

use super::requirements::RequirementMatcher;
use super::{Hit, MatchContext, MatchTier};
use crate::error::{compile, Result};

fn keyword_alternation<'a>(words: impl IntoIterator<Item = &'a String>) -> String {
    let mut words: Vec<&String> = words.into_iter().collect();
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    words
        .iter()
        .map(|w| regex::escape(&w.to_lowercase()).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

pub(crate) struct PreferenceMatcher {
    rules: Vec<(PreferenceTag, Regex)>,
}

impl PreferenceMatcher {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let mut rules = Vec::with_capacity(lexicon.preference_keywords.len());
        for (tag, words) in &lexicon.preference_keywords {
            if words.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i)(?:^|\W)(?:{})(?:$|\W)", keyword_alternation(words));
            rules.push((*tag, compile(&pattern)?));
        }
        Ok(Self { rules })
    }

    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let mut tags = BTreeSet::new();
        let mut span: Option<Span> = None;

        for (tag, regex) in &self.rules {
            if let Some(m) = regex.find(ctx.text) {
                tags.insert(*tag);
                let found = Span::new(m.start(), m.end());
                span = Some(span.map_or(found, |s| s.cover(found)));
            }
        }

        let span = span?;
        Some(Hit::new(FieldValue::Tags(tags), MatchTier::Fuzzy, span))
    }
}

pub(crate) struct RequestMatcher {
    explicit: Regex,
    separators: Regex,
    phrases: Option<Regex>,
    canonical: HashMap<String, String>,
    requirements: RequirementMatcher,
}

impl RequestMatcher {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let canonical: HashMap<String, String> = lexicon
            .special_request_phrases
            .iter()
            .map(|p| (p.to_lowercase(), p.clone()))
            .collect();

        let phrases = if canonical.is_empty() {
            None
        } else {
            let pattern = format!(
                r"(?i)(?:^|\W)(?P<phrase>{})(?:$|\W)",
                keyword_alternation(canonical.keys())
            );
            Some(compile(&pattern)?)
        };

        Ok(Self {
            explicit: compile(
                r"(?im)(?:special\s+(?:requests?|requirements?|needs)|requests?|requirements?|note|विशेष\s+अनुरोध)\s*[:\-]\s*(?P<list>.+)$",
            )?,
            separators: compile(r"(?i)\s*(?:,|;|\band\b|\bऔर\b)\s*")?,
            phrases,
            canonical,
            requirements: RequirementMatcher::new()?,
        })
    }

    /// Listed or lexicon requests, followed by requirements stated in prose
    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let listed = self.explicit(ctx).or_else(|| self.lexicon_phrases(ctx));
        let Some((required, required_span)) = self.requirements.find(ctx) else {
            return listed;
        };

        match listed {
            Some(mut hit) => {
                if let FieldValue::Requests(requests) = &mut hit.value {
                    merge_unique_ci(requests, required);
                }
                hit.span = Some(hit.span.map_or(required_span, |s| s.cover(required_span)));
                Some(hit)
            },
            None => Some(Hit::new(FieldValue::Requests(required), MatchTier::Fuzzy, required_span)),
        }
    }

    /// "Special requests: wheelchair, early check-in"
    fn explicit(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let caps = self.explicit.captures(ctx.text)?;
        let list = caps.name("list")?;

        let mut requests = Vec::new();
        let items = self
            .separators
            .split(list.as_str())
            .map(|item| item.trim().trim_end_matches(['.', '!']).trim())
            .filter(|item| !item.is_empty());
        merge_unique_ci(&mut requests, items);

        if requests.is_empty() {
            return None;
        }
        Some(Hit::new(
            FieldValue::Requests(requests),
            MatchTier::Exact,
            Span::new(list.start(), list.end()),
        ))
    }

    fn lexicon_phrases(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let regex = self.phrases.as_ref()?;
        let mut requests = Vec::new();
        let mut span: Option<Span> = None;

        // Overlapping boundaries: restart the search just past each phrase
        let mut pos = 0;
        while pos <= ctx.text.len() {
            let Some(caps) = regex.captures_at(ctx.text, pos) else { break };
            let Some(phrase) = caps.name("phrase") else { break };
            let key = phrase.as_str().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            if let Some(canonical) = self.canonical.get(&key) {
                merge_unique_ci(&mut requests, [canonical.as_str()]);
                let found = Span::new(phrase.start(), phrase.end());
                span = Some(span.map_or(found, |s| s.cover(found)));
            }
            pos = phrase.end();
        }

        let span = span?;
        Some(Hit::new(FieldValue::Requests(requests), MatchTier::Fuzzy, span))
    }
}
