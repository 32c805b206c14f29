//! Traveler count rules

use regex::{Captures, Regex};
use travel_inquiry_core::{FieldValue, Span};

use super::{Hit, MatchContext, MatchTier};
use crate::error::{compile, Result};
use crate::numbers::{english_number_word_pattern, number_word_pattern, parse_count};
use crate::text::following;

pub(crate) struct TravelerMatcher {
    adults: Regex,
    children: Regex,
    counted: Regex,
    group: Regex,
    hindi_counted: Regex,
    couple: Regex,
    solo: Regex,
    family: Regex,
    honeymoon: Regex,
    family_default_size: u32,
}

impl TravelerMatcher {
    pub fn new(family_default_size: u32) -> Result<Self> {
        let en = format!(r"[0-9]{{1,2}}|{}", english_number_word_pattern());
        let any = format!(r"[0-9]{{1,2}}|[०-९]{{1,2}}|{}", number_word_pattern());

        Ok(Self {
            adults: compile(&format!(
                r"(?i)\b(?P<n>{})\s+(?:adults?|grown-?ups?|bade|बड़े|वयस्क)\b",
                any
            ))?,
            children: compile(&format!(
                r"(?i)\b(?P<n>{})\s+(?:child(?:ren)?|kids?|infants?|bachche|bacche|बच्चे|बच्चों)\b",
                any
            ))?,
            counted: compile(&format!(
                r"(?i)\b(?P<n>{})\s+(?:people|persons?|pax|travell?ers?|guests?|members?|passengers?|adults?|heads)\b",
                en
            ))?,
            group: compile(&format!(
                r"(?i)\b(?:family|group|party)\s+of\s+(?P<n>{en})\b|\bwe\s+are\s+(?P<n2>{en})\b|\b(?P<n3>{en})\s+of\s+us\b",
                en = en
            ))?,
            hindi_counted: compile(&format!(
                r"(?i)\b(?P<n>{})\s*(?:log|logon|logo|लोग|लोगों|यात्री|vyakti|व्यक्ति)\b",
                any
            ))?,
            couple: compile(r"(?i)\b(?:couple|husband\s+and\s+wife|wife\s+and\s+(?:i|me)|husband\s+and\s+(?:i|me)|me\s+and\s+my\s+(?:wife|husband|partner)|pati\s+patni)\b|पति\s+पत्नी")?,
            solo: compile(r"(?i)\b(?:solo|alone|just\s+me|only\s+me|akela|akeli)\b|अकेले|अकेला")?,
            family: compile(r"(?i)\b(?:family|families|parivar)\b|परिवार")?,
            honeymoon: compile(r"(?i)\bhoneymoon\b|हनीमून")?,
            family_default_size,
        })
    }

    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        self.split(ctx)
            .or_else(|| self.counted(ctx))
            .or_else(|| self.group(ctx))
            .or_else(|| self.hindi(ctx))
            .or_else(|| self.couple(ctx))
            .or_else(|| self.fixed(&self.solo, ctx.text, 1, MatchTier::Fuzzy))
            .or_else(|| self.fixed(&self.family, ctx.text, self.family_default_size, MatchTier::Inferred))
            .or_else(|| self.fixed(&self.honeymoon, ctx.text, 2, MatchTier::Inferred))
    }

    /// "2 adults and 1 child" sums both
    fn split(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let adults = first_count(&self.adults, ctx.text, &["n"]);
        let children = first_count(&self.children, ctx.text, &["n"]);
        let (total, span) = match (adults, children) {
            (Some((a, sa)), Some((c, sc))) => (a + c, sa.cover(sc)),
            (Some(found), None) | (None, Some(found)) => found,
            (None, None) => return None,
        };
        Some(Hit::new(FieldValue::Integer(total), MatchTier::Exact, span))
    }

    fn counted(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let (n, span) = first_count(&self.counted, ctx.text, &["n"])?;
        Some(Hit::new(FieldValue::Integer(n), MatchTier::Exact, span))
    }

    fn group(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        let (n, span) = first_count(&self.group, ctx.text, &["n", "n2", "n3"])?;
        Some(Hit::new(FieldValue::Integer(n), MatchTier::Exact, span))
    }

    fn hindi(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        if !ctx.hindi {
            return None;
        }
        let (n, span) = first_count(&self.hindi_counted, ctx.text, &["n"])?;
        Some(Hit::new(FieldValue::Integer(n), MatchTier::Exact, span))
    }

    fn couple(&self, ctx: &MatchContext<'_>) -> Option<Hit> {
        // "a couple of days" is not a party of two
        let m = self
            .couple
            .find_iter(ctx.text)
            .find(|m| !following(ctx.text, m.end(), 4).trim_start().starts_with("of"))?;
        Some(Hit::new(FieldValue::Integer(2), MatchTier::Fuzzy, Span::new(m.start(), m.end())))
    }

    fn fixed(&self, regex: &Regex, text: &str, count: u32, tier: MatchTier) -> Option<Hit> {
        let m = regex.find(text)?;
        Some(Hit::new(FieldValue::Integer(count), tier, Span::new(m.start(), m.end())))
    }
}

fn first_count(regex: &Regex, text: &str, groups: &[&str]) -> Option<(u32, Span)> {
    regex.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let n = count_from(&caps, groups)?;
        Some((n, Span::new(whole.start(), whole.end())))
    })
}

fn count_from(caps: &Captures<'_>, groups: &[&str]) -> Option<u32> {
    groups
        .iter()
        .find_map(|name| caps.name(name))
        .and_then(|m| parse_count(m.as_str()))
        .filter(|n| *n > 0)
}
