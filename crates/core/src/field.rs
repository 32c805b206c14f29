//! Field catalog and extraction candidates
//!
//! Every extractor proposes [`ExtractedField`] candidates for the fixed
//! catalog in [`FieldName`]. Candidates are not authoritative until fused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Catalog of extractable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    TravelerCount,
    Budget,
    Destinations,
    DepartureCity,
    TravelDates,
    Preferences,
    SpecialRequests,
    ReferenceId,
}

impl FieldName {
    pub const ALL: [FieldName; 8] = [
        FieldName::TravelerCount,
        FieldName::Budget,
        FieldName::Destinations,
        FieldName::DepartureCity,
        FieldName::TravelDates,
        FieldName::Preferences,
        FieldName::SpecialRequests,
        FieldName::ReferenceId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TravelerCount => "traveler_count",
            Self::Budget => "budget",
            Self::Destinations => "destinations",
            Self::DepartureCity => "departure_city",
            Self::TravelDates => "travel_dates",
            Self::Preferences => "preferences",
            Self::SpecialRequests => "special_requests",
            Self::ReferenceId => "reference_id",
        }
    }

    /// Scalar fields hold exactly one value; the rest are collections
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Self::Destinations | Self::Preferences | Self::SpecialRequests
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preference tags recognized in inquiries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreferenceTag {
    Honeymoon,
    Adventure,
    BudgetConscious,
    Luxury,
    Family,
    Beach,
    HillStation,
    Pilgrimage,
    Wildlife,
    Cultural,
}

impl PreferenceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Honeymoon => "honeymoon",
            Self::Adventure => "adventure",
            Self::BudgetConscious => "budget-conscious",
            Self::Luxury => "luxury",
            Self::Family => "family",
            Self::Beach => "beach",
            Self::HillStation => "hill-station",
            Self::Pilgrimage => "pilgrimage",
            Self::Wildlife => "wildlife",
            Self::Cultural => "cultural",
        }
    }

    /// Parse a tag name as written by people or models
    ///
    /// Accepts kebab, snake and spaced spellings.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "honeymoon" | "romantic" => Some(Self::Honeymoon),
            "adventure" => Some(Self::Adventure),
            "budget-conscious" | "budget" | "budget-friendly" => Some(Self::BudgetConscious),
            "luxury" => Some(Self::Luxury),
            "family" | "family-friendly" => Some(Self::Family),
            "beach" => Some(Self::Beach),
            "hill-station" | "hills" | "mountains" => Some(Self::HillStation),
            "pilgrimage" | "religious" => Some(Self::Pilgrimage),
            "wildlife" | "safari" => Some(Self::Wildlife),
            "cultural" | "heritage" => Some(Self::Cultural),
            _ => None,
        }
    }
}

impl fmt::Display for PreferenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money amount with currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    /// ISO 4217 code
    pub currency: String,
    #[serde(default)]
    pub per_person: bool,
}

impl Money {
    pub const DEFAULT_CURRENCY: &'static str = "INR";

    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            per_person: false,
        }
    }

    pub fn inr(amount: f64) -> Self {
        Self::new(amount, Self::DEFAULT_CURRENCY)
    }

    pub fn per_person(mut self, per_person: bool) -> Self {
        self.per_person = per_person;
        self
    }

    /// Equal within 1% of the larger amount
    pub fn approx_eq(&self, other: &Money) -> bool {
        if !self.currency.eq_ignore_ascii_case(&other.currency) || self.per_person != other.per_person {
            return false;
        }
        let scale = self.amount.abs().max(other.amount.abs()).max(1.0);
        (self.amount - other.amount).abs() / scale <= 0.01
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.0}", self.currency, self.amount)?;
        if self.per_person {
            f.write_str(" per person")?;
        }
        Ok(())
    }
}

/// Travel date range; either end may be open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub duration_days: Option<u32>,
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        let days = (end - start).num_days();
        Self {
            start: Some(start),
            end: Some(end),
            duration_days: u32::try_from(days + 1).ok().filter(|d| *d > 0),
        }
    }

    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    pub fn duration(days: u32) -> Self {
        Self {
            duration_days: Some(days),
            ..Default::default()
        }
    }

    /// Apply a trip length to the start anchor; an explicit end is kept
    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        if let (Some(start), None) = (self.start, self.end) {
            if days > 0 {
                self.end = start.checked_add_days(chrono::Days::new(u64::from(days - 1)));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.duration_days.is_none()
    }

    /// start <= end when both are present
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
        write!(f, "{}..{}", fmt_date(self.start), fmt_date(self.end))?;
        if let Some(days) = self.duration_days {
            write!(f, " ({} days)", days)?;
        }
        Ok(())
    }
}

/// Typed value of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Integer(u32),
    Money(Money),
    /// Ordered place names, first mention first
    Places(Vec<String>),
    Text(String),
    DateRange(DateRange),
    Tags(BTreeSet<PreferenceTag>),
    /// Free-text set in first-seen order
    Requests(Vec<String>),
}

impl FieldValue {
    /// Whether two values from different sources confirm each other
    pub fn agrees_with(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Money(a), Self::Money(b)) => a.approx_eq(b),
            (Self::Text(a), Self::Text(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            (Self::DateRange(a), Self::DateRange(b)) => a == b,
            (Self::Places(a), Self::Places(b)) => overlap_in_same_order(a, b),
            (Self::Tags(a), Self::Tags(b)) => a == b,
            (Self::Requests(a), Self::Requests(b)) => {
                let left: BTreeSet<String> = a.iter().map(|s| s.to_lowercase()).collect();
                let right: BTreeSet<String> = b.iter().map(|s| s.to_lowercase()).collect();
                left == right
            },
            _ => false,
        }
    }

    /// Values equal for contradiction checks within one source
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Places(_), Self::Places(_)) => self == other,
            _ => self.agrees_with(other),
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_places(&self) -> Option<&[String]> {
        match self {
            Self::Places(places) => Some(places),
            _ => None,
        }
    }

    pub fn as_money(&self) -> Option<&Money> {
        match self {
            Self::Money(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_date_range(&self) -> Option<&DateRange> {
        match self {
            Self::DateRange(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&BTreeSet<PreferenceTag>> {
        match self {
            Self::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn as_requests(&self) -> Option<&[String]> {
        match self {
            Self::Requests(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Money(m) => write!(f, "{}", m),
            Self::Places(p) => write!(f, "[{}]", p.join(", ")),
            Self::Text(s) => f.write_str(s),
            Self::DateRange(d) => write!(f, "{}", d),
            Self::Tags(tags) => {
                let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
                write!(f, "{{{}}}", names.join(", "))
            },
            Self::Requests(r) => write!(f, "{{{}}}", r.join("; ")),
        }
    }
}

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Pattern,
    Statistical,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Statistical => "statistical",
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte offsets into the normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Smallest span covering both
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A sourced, scored value proposed for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub field: FieldName,
    pub value: FieldValue,
    pub source: ExtractionSource,
    pub confidence: f32,
    #[serde(default)]
    pub span: Option<Span>,
}

impl ExtractedField {
    pub fn new(field: FieldName, value: FieldValue, source: ExtractionSource, confidence: f32) -> Self {
        Self {
            field,
            value,
            source,
            confidence: confidence.clamp(0.0, 1.0),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// Whether the places shared by both lists appear in the same relative order
///
/// Comparison is case-insensitive. Lists with nothing in common do not overlap.
pub fn overlap_in_same_order(a: &[String], b: &[String]) -> bool {
    let lower_b: Vec<String> = b.iter().map(|s| s.to_lowercase()).collect();
    let lower_a: Vec<String> = a.iter().map(|s| s.to_lowercase()).collect();
    let common_in_a: Vec<&String> = lower_a.iter().filter(|p| lower_b.contains(p)).collect();
    let common_in_b: Vec<&String> = lower_b.iter().filter(|p| lower_a.contains(p)).collect();
    !common_in_a.is_empty() && common_in_a == common_in_b
}

/// Append items not already present, ignoring case; keeps first-seen order
pub fn merge_unique_ci<I>(target: &mut Vec<String>, items: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if !target.iter().any(|existing| existing.to_lowercase() == lower) {
            target.push(trimmed.to_string());
        }
    }
}
