//! Travel date expressions
//!
//! Explicit ranges ("10-15 May", "Dec 28 to Jan 3", "10/05/2026 - 15/05/2026"),
//! single start anchors ("from 10th May"), relative expressions ("next month",
//! "agle hafte", "this weekend", "in December") and trip lengths ("5 days",
//! "4 nights", "4N/5D", "ek hafta"). Dates without a year resolve against a
//! reference date and roll forward to the next occurrence.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use regex::{Captures, Regex};
use travel_inquiry_core::{DateRange, Span};

use crate::error::{compile, Result};
use crate::numbers::{number_word_pattern, parse_count};

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?|जनवरी|फ़रवरी|फरवरी|मार्च|अप्रैल|मई|जून|जुलाई|अगस्त|सितंबर|सितम्बर|अक्टूबर|अक्तूबर|नवंबर|नवम्बर|दिसंबर|दिसम्बर";

const ORDINAL: &str = r"(?:st|nd|rd|th)?";

const RANGE_JOIN: &str = r"(?:-|to|till|until|and|se|तक|से)";

/// A date expression and where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub range: DateRange,
    pub span: Span,
}

/// A trip length and where it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationMatch {
    pub days: u32,
    pub span: Span,
    /// Written with digits rather than words
    pub numeric: bool,
}

#[derive(Debug, Clone)]
pub struct DateParser {
    range_day_month: Regex,
    range_month_day: Regex,
    range_numeric: Regex,
    anchor_day_month: Regex,
    anchor_month_day: Regex,
    anchor_numeric: Regex,
    next_month: Regex,
    next_week: Regex,
    weekend: Regex,
    tomorrow: Regex,
    in_month: Regex,
    nights_days: Regex,
    counted: Regex,
    one_week: Regex,
    weekend_length: Regex,
}

impl DateParser {
    pub fn new() -> Result<Self> {
        let numbers = number_word_pattern();
        Ok(Self {
            range_day_month: compile(&format!(
                r"(?i)\b(?P<d1>[0-9]{{1,2}}){o}(?:\s+(?:of\s+)?(?P<m1>{m}))?\s*{j}\s*(?P<d2>[0-9]{{1,2}}){o}\s+(?:of\s+)?(?P<m2>{m})\b(?:,?\s*(?P<y>[0-9]{{4}}))?",
                o = ORDINAL,
                m = MONTHS,
                j = RANGE_JOIN
            ))?,
            range_month_day: compile(&format!(
                r"(?i)\b(?P<m1>{m})\s+(?P<d1>[0-9]{{1,2}}){o}\s*{j}\s*(?:(?P<m2>{m})\s+)?(?P<d2>[0-9]{{1,2}}){o}\b(?:,?\s*(?P<y>[0-9]{{4}}))?",
                o = ORDINAL,
                m = MONTHS,
                j = RANGE_JOIN
            ))?,
            range_numeric: compile(
                r"\b(?P<d1>[0-9]{1,2})[/.](?P<m1>[0-9]{1,2})(?:[/.](?P<y1>[0-9]{2,4}))?\s*(?:-|to|till|until)\s*(?P<d2>[0-9]{1,2})[/.](?P<m2>[0-9]{1,2})[/.](?P<y2>[0-9]{2,4})\b",
            )?,
            anchor_day_month: compile(&format!(
                r"(?i)\b(?P<d>[0-9]{{1,2}}){o}\s+(?:of\s+)?(?P<m>{m})\b(?:,?\s*(?P<y>[0-9]{{4}}))?",
                o = ORDINAL,
                m = MONTHS
            ))?,
            anchor_month_day: compile(&format!(
                r"(?i)\b(?P<m>{m})\s+(?P<d>[0-9]{{1,2}}){o}\b(?:,?\s*(?P<y>[0-9]{{4}}))?",
                o = ORDINAL,
                m = MONTHS
            ))?,
            anchor_numeric: compile(r"\b(?P<d>[0-9]{1,2})[/.-](?P<m>[0-9]{1,2})[/.-](?P<y>[0-9]{2,4})\b")?,
            next_month: compile(r"(?i)\b(?:next|coming)\s+month\b|\bagle\s+mahin[ea]\b|अगले\s+महीने")?,
            next_week: compile(r"(?i)\b(?:next|coming)\s+week\b|\bagle\s+hafte\b|अगले\s+हफ्ते")?,
            weekend: compile(r"(?i)\b(?:this|coming|next|is)\s+weekend\b")?,
            tomorrow: compile(r"(?i)\btomorrow\b")?,
            in_month: compile(&format!(
                r"(?i)\b(?:in|during|around|by)\s+(?:the\s+month\s+of\s+)?(?P<m>{m})\b(?:\s+(?P<y>[0-9]{{4}}))?|\b(?P<m2>{m})\s+(?:mein|me|में)",
                m = MONTHS
            ))?,
            nights_days: compile(r"(?i)\b(?P<n>[0-9]{1,2})\s*N\s*/\s*(?P<d>[0-9]{1,2})\s*D\b")?,
            counted: compile(&format!(
                r"(?i)\b(?P<n>[0-9]{{1,2}}|{}|[०-९]{{1,2}})\s*(?:-\s*)?(?P<unit>days?|din|दिन|nights?|raat(?:ein|en)?|रात|रातें|weeks?|hafte|हफ्ते)\b",
                numbers
            ))?,
            one_week: compile(r"(?i)\b(?:a|one|ek)\s+(?:week|hafta|hafte)\b|एक\s+हफ्ता")?,
            weekend_length: compile(r"(?i)\bweekend\b")?,
        })
    }

    /// First explicit start-and-end range
    pub fn explicit_range(&self, text: &str, reference: NaiveDate) -> Option<DateMatch> {
        self.explicit_ranges(text, reference).into_iter().next()
    }

    /// First single dated start anchor
    pub fn start_anchor(&self, text: &str, reference: NaiveDate) -> Option<DateMatch> {
        self.anchors(text, reference).into_iter().next()
    }

    /// First relative expression resolved against `reference`
    pub fn relative(&self, text: &str, reference: NaiveDate) -> Option<DateMatch> {
        let mut found: Vec<DateMatch> = Vec::new();

        if let Some(m) = self.next_month.find(text) {
            let start = first_of_month(reference).checked_add_months(Months::new(1))?;
            found.push(DateMatch {
                range: DateRange::starting(start),
                span: Span::new(m.start(), m.end()),
            });
        }

        if let Some(m) = self.next_week.find(text) {
            let days_ahead = 7 - reference.weekday().num_days_from_monday();
            let start = reference.checked_add_days(Days::new(u64::from(days_ahead)))?;
            found.push(DateMatch {
                range: DateRange::starting(start),
                span: Span::new(m.start(), m.end()),
            });
        }

        if let Some(m) = self.weekend.find(text) {
            let start = upcoming(reference, Weekday::Sat);
            found.push(DateMatch {
                range: DateRange::starting(start).with_duration(2),
                span: Span::new(m.start(), m.end()),
            });
        }

        if let Some(m) = self.tomorrow.find(text) {
            let start = reference.checked_add_days(Days::new(1))?;
            found.push(DateMatch {
                range: DateRange::starting(start),
                span: Span::new(m.start(), m.end()),
            });
        }

        for caps in self.in_month.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(month) = caps
                .name("m")
                .or_else(|| caps.name("m2"))
                .and_then(|m| month_number(m.as_str()))
            else {
                continue;
            };
            let year = caps.name("y").and_then(|y| y.as_str().parse::<i32>().ok());
            if let Some(start) = resolve(1, month, year, first_of_month(reference)) {
                found.push(DateMatch {
                    range: DateRange::starting(start),
                    span: Span::new(whole.start(), whole.end()),
                });
                break;
            }
        }

        found.into_iter().min_by_key(|m| m.span.start)
    }

    /// First trip-length expression
    pub fn duration(&self, text: &str) -> Option<DurationMatch> {
        let mut found: Vec<DurationMatch> = Vec::new();

        if let Some(caps) = self.nights_days.captures(text) {
            if let (Some(whole), Some(days)) = (caps.get(0), caps.name("d").and_then(|d| d.as_str().parse().ok())) {
                found.push(DurationMatch {
                    days,
                    span: Span::new(whole.start(), whole.end()),
                    numeric: true,
                });
            }
        }

        for caps in self.counted.captures_iter(text) {
            let (Some(whole), Some(n), Some(unit)) = (caps.get(0), caps.name("n"), caps.name("unit")) else {
                continue;
            };
            let Some(count) = parse_count(n.as_str()).filter(|c| *c > 0) else {
                continue;
            };
            let unit = unit.as_str().to_lowercase();
            let days = if unit.starts_with("night") || unit.starts_with("raat") || unit.starts_with("रात") {
                count + 1
            } else if unit.starts_with("week") || unit == "hafte" || unit == "हफ्ते" {
                count * 7
            } else {
                count
            };
            found.push(DurationMatch {
                days,
                span: Span::new(whole.start(), whole.end()),
                numeric: n.as_str().chars().all(|c| c.is_ascii_digit()),
            });
            break;
        }

        if let Some(m) = self.one_week.find(text) {
            found.push(DurationMatch {
                days: 7,
                span: Span::new(m.start(), m.end()),
                numeric: false,
            });
        }

        if found.is_empty() {
            if let Some(m) = self.weekend_length.find(text) {
                found.push(DurationMatch {
                    days: 2,
                    span: Span::new(m.start(), m.end()),
                    numeric: false,
                });
            }
        }

        found.into_iter().min_by_key(|m| m.span.start)
    }

    /// Best single reading of a date mention
    ///
    /// Explicit range, else anchor or relative start extended by any trip
    /// length, else the trip length alone.
    pub fn parse(&self, text: &str, reference: NaiveDate) -> Option<DateRange> {
        if let Some(range) = self.explicit_range(text, reference) {
            return Some(range.range);
        }

        let duration = self.duration(text).map(|d| d.days);
        let start = self
            .start_anchor(text, reference)
            .or_else(|| self.relative(text, reference));

        match (start, duration) {
            (Some(start), Some(days)) => Some(start.range.with_duration(days)),
            (Some(start), None) => Some(start.range),
            (None, Some(days)) => Some(DateRange::duration(days)),
            (None, None) => None,
        }
    }

    /// Every explicit range and anchor in mention order, overlaps removed
    pub fn all_dates(&self, text: &str, reference: NaiveDate) -> Vec<DateMatch> {
        let mut all = self.explicit_ranges(text, reference);
        for anchor in self.anchors(text, reference) {
            let overlaps = all
                .iter()
                .any(|m| anchor.span.start < m.span.end && m.span.start < anchor.span.end);
            if !overlaps {
                all.push(anchor);
            }
        }
        all.sort_by_key(|m| m.span.start);
        all
    }

    fn explicit_ranges(&self, text: &str, reference: NaiveDate) -> Vec<DateMatch> {
        let mut found = Vec::new();

        for regex in [&self.range_day_month, &self.range_month_day] {
            for caps in regex.captures_iter(text) {
                if let Some(m) = named_range(&caps, reference) {
                    found.push(m);
                }
            }
        }

        for caps in self.range_numeric.captures_iter(text) {
            if let Some(m) = numeric_range(&caps) {
                found.push(m);
            }
        }

        found.sort_by_key(|m| m.span.start);
        found
    }

    fn anchors(&self, text: &str, reference: NaiveDate) -> Vec<DateMatch> {
        let mut found: Vec<DateMatch> = Vec::new();

        for regex in [&self.anchor_day_month, &self.anchor_month_day] {
            for caps in regex.captures_iter(text) {
                let (Some(whole), Some(day), Some(month)) = (
                    caps.get(0),
                    caps.name("d").and_then(|d| d.as_str().parse::<u32>().ok()),
                    caps.name("m").and_then(|m| month_number(m.as_str())),
                ) else {
                    continue;
                };
                let year = caps.name("y").and_then(|y| y.as_str().parse::<i32>().ok());
                if let Some(start) = resolve(day, month, year, reference) {
                    found.push(DateMatch {
                        range: DateRange::starting(start),
                        span: Span::new(whole.start(), whole.end()),
                    });
                }
            }
        }

        for caps in self.anchor_numeric.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let parsed = (
                caps.name("d").and_then(|d| d.as_str().parse::<u32>().ok()),
                caps.name("m").and_then(|m| m.as_str().parse::<u32>().ok()),
                caps.name("y").and_then(|y| parse_year(y.as_str())),
            );
            if let (Some(day), Some(month), Some(year)) = parsed {
                if let Some(start) = NaiveDate::from_ymd_opt(year, month, day) {
                    found.push(DateMatch {
                        range: DateRange::starting(start),
                        span: Span::new(whole.start(), whole.end()),
                    });
                }
            }
        }

        found.sort_by_key(|m| m.span.start);
        found.dedup_by(|later, earlier| later.span.start < earlier.span.end);
        found
    }
}

fn named_range(caps: &Captures<'_>, reference: NaiveDate) -> Option<DateMatch> {
    let whole = caps.get(0)?;
    let d1 = caps.name("d1")?.as_str().parse::<u32>().ok()?;
    let d2 = caps.name("d2")?.as_str().parse::<u32>().ok()?;
    let m1 = month_number(caps.name("m1")?.as_str())?;
    let m2 = match caps.name("m2") {
        Some(m) => month_number(m.as_str())?,
        None => m1,
    };
    // "10-15 May": the first month is implied by the second
    let m1 = if caps.name("m1").is_some() { m1 } else { m2 };
    let year = caps.name("y").and_then(|y| y.as_str().parse::<i32>().ok());

    let (start, end) = match year {
        Some(year) => {
            let end = NaiveDate::from_ymd_opt(year, m2, d2)?;
            let mut start = NaiveDate::from_ymd_opt(year, m1, d1)?;
            if start > end {
                start = NaiveDate::from_ymd_opt(year - 1, m1, d1)?;
            }
            (start, end)
        },
        None => {
            let start = resolve(d1, m1, None, reference)?;
            let mut end = NaiveDate::from_ymd_opt(start.year(), m2, d2)?;
            if end < start {
                end = NaiveDate::from_ymd_opt(start.year() + 1, m2, d2)?;
            }
            (start, end)
        },
    };

    Some(DateMatch {
        range: DateRange::between(start, end),
        span: Span::new(whole.start(), whole.end()),
    })
}

fn numeric_range(caps: &Captures<'_>) -> Option<DateMatch> {
    let whole = caps.get(0)?;
    let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
    let end_year = parse_year(caps.name("y2")?.as_str())?;
    let end = NaiveDate::from_ymd_opt(end_year, number("m2")?, number("d2")?)?;

    let start_year = match caps.name("y1") {
        Some(y) => parse_year(y.as_str())?,
        None => end_year,
    };
    let mut start = NaiveDate::from_ymd_opt(start_year, number("m1")?, number("d1")?)?;
    if start > end && caps.name("y1").is_none() {
        start = NaiveDate::from_ymd_opt(start_year - 1, number("m1")?, number("d1")?)?;
    }

    Some(DateMatch {
        range: DateRange::between(start, end),
        span: Span::new(whole.start(), whole.end()),
    })
}

/// Month number for an English or Hindi month name
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    let month = match lower.as_str() {
        "जनवरी" => 1,
        "फ़रवरी" | "फरवरी" => 2,
        "मार्च" => 3,
        "अप्रैल" => 4,
        "मई" => 5,
        "जून" => 6,
        "जुलाई" => 7,
        "अगस्त" => 8,
        "सितंबर" | "सितम्बर" => 9,
        "अक्टूबर" | "अक्तूबर" => 10,
        "नवंबर" | "नवम्बर" => 11,
        "दिसंबर" | "दिसम्बर" => 12,
        other => {
            let prefix: String = other.chars().take(3).collect();
            match prefix.as_str() {
                "jan" => 1,
                "feb" => 2,
                "mar" => 3,
                "apr" => 4,
                "may" => 5,
                "jun" => 6,
                "jul" => 7,
                "aug" => 8,
                "sep" => 9,
                "oct" => 10,
                "nov" => 11,
                "dec" => 12,
                _ => return None,
            }
        },
    };
    Some(month)
}

/// Resolve a day and month; a missing year means the next occurrence on or
/// after `reference`
fn resolve(day: u32, month: u32, year: Option<i32>, reference: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day);
    match this_year {
        Some(date) if date >= reference => Some(date),
        _ => NaiveDate::from_ymd_opt(reference.year() + 1, month, day),
    }
}

fn parse_year(text: &str) -> Option<i32> {
    let value = text.parse::<i32>().ok()?;
    match text.len() {
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn upcoming(reference: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - reference.weekday().num_days_from_monday()) % 7;
    reference
        .checked_add_days(Days::new(u64::from(ahead)))
        .unwrap_or(reference)
}
