//! Trip requirements written as prose
//!
//! Hotel class, property type, meal plan, flight needs, planned activities
//! and reply urgency are reported as canonical special requests so they
//! survive fusion as one set: "4-star hotel", "homestay",
//! "meal plan: breakfast only", "flights not required", "activity: ubud tour",
//! "respond within 3 days".

use regex::{Captures, Regex};
use travel_inquiry_core::{merge_unique_ci, Span};

use super::MatchContext;
use crate::error::{compile, Result};

/// How a rule words what it matched
enum Render {
    Fixed(fn(&Captures<'_>) -> Vec<String>),
    /// The `list` group holds several items
    List,
}

struct Rule {
    regex: Regex,
    render: Render,
    /// Every match counts, not just the first
    repeat: bool,
}

impl Rule {
    fn new(pattern: &str, render: Render, repeat: bool) -> Result<Self> {
        Ok(Self {
            regex: compile(pattern)?,
            render,
            repeat,
        })
    }
}

pub(crate) struct RequirementMatcher {
    rules: Vec<Rule>,
    separators: Regex,
}

impl RequirementMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: vec![
                Rule::new(
                    r"(?i)\b(?P<stars>[1-7]|three|four|five|seven)(?:\s*-\s*|\s+)?stars?\b",
                    Render::Fixed(hotel_class),
                    false,
                )?,
                Rule::new(
                    r"(?i)\b(?P<kind>water\s+villas?|pool\s+villas?|private\s+villas?|beach\s+resorts?|boutique\s+hotels?|home\s*stays?|house\s*boats?|tree\s*houses?|hostels?)\b",
                    Render::Fixed(property_kind),
                    true,
                )?,
                Rule::new(
                    r"(?i)\b(?P<plan>all\s+meals?|breakfast\s+(?:and|&)\s+dinner|breakfast\s+only|only\s+breakfast|half\s+board|full\s+board|all[\s-]+inclusive)\b",
                    Render::Fixed(meal_plan),
                    false,
                )?,
                Rule::new(
                    r"(?i)(?P<no>\bflights?\s+(?:are\s+|is\s+)?not\s+(?:required|needed|included)|\b(?:without|excluding|no)\s+flights?\b)|(?P<yes>\bflights?\s+(?:are\s+|is\s+)?(?:required|needed|included)|\b(?:with|including|plus)\s+flights?\b|\bflights?\s+आवश्यक)",
                    Render::Fixed(flights),
                    false,
                )?,
                Rule::new(
                    r"(?i)(?P<asap>\basap\b|\bas\s+soon\s+as\s+possible\b|\burgent(?:ly)?\b)|\bby\s+(?P<by>eod|end\s+of\s+(?:the\s+)?day|tomorrow|today)\b|\b(?:reply|respond|revert|quote|quotation|send|share|confirm)\b[^.\n]{0,40}?\bwithin\s+(?P<days>\d{1,2})\s+days?\b",
                    Render::Fixed(urgency),
                    false,
                )?,
                Rule::new(
                    r"(?im)(?:\bactivit(?:y|ies)\s*[:\-]|\b(?:would\s+like\s+to\s+include|planning\s+to\s+do|hoping\s+to\s+do)\b)\s*(?P<list>[^.\n]+)",
                    Render::List,
                    false,
                )?,
            ],
            separators: compile(r"(?i)\s*(?:,|;|\band\b|\bऔर\b)\s*")?,
        })
    }

    /// Requirements in rule order, with the span covering every match
    pub fn find(&self, ctx: &MatchContext<'_>) -> Option<(Vec<String>, Span)> {
        let mut found = Vec::new();
        let mut span: Option<Span> = None;

        for rule in &self.rules {
            let matches: Vec<Captures<'_>> = if rule.repeat {
                rule.regex.captures_iter(ctx.text).collect()
            } else {
                rule.regex.captures(ctx.text).into_iter().collect()
            };
            for caps in matches {
                let items = match &rule.render {
                    Render::Fixed(render) => render(&caps),
                    Render::List => caps
                        .name("list")
                        .map(|list| self.activities(list.as_str()))
                        .unwrap_or_default(),
                };
                if items.is_empty() {
                    continue;
                }
                merge_unique_ci(&mut found, items);
                if let Some(m) = caps.get(0) {
                    let hit = Span::new(m.start(), m.end());
                    span = Some(span.map_or(hit, |s| s.cover(hit)));
                }
            }
        }

        let span = span?;
        Some((found, span))
    }

    /// "Activities: Ubud tour and Tanah Lot temple"
    fn activities(&self, list: &str) -> Vec<String> {
        self.separators
            .split(list)
            .map(|item| item.trim().trim_end_matches(['.', '!']).trim())
            .filter(|item| item.chars().count() > 3)
            .map(|item| format!("activity: {}", squash(item).to_lowercase()))
            .collect()
    }
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hotel_class(caps: &Captures<'_>) -> Vec<String> {
    let stars = match caps.name("stars").map(|m| m.as_str().to_lowercase()) {
        Some(word) => match word.as_str() {
            "three" => "3".to_string(),
            "four" => "4".to_string(),
            "five" => "5".to_string(),
            "seven" => "7".to_string(),
            _ => word,
        },
        None => return Vec::new(),
    };
    vec![format!("{}-star hotel", stars)]
}

fn property_kind(caps: &Captures<'_>) -> Vec<String> {
    let Some(kind) = caps.name("kind") else {
        return Vec::new();
    };
    let kind = squash(kind.as_str()).to_lowercase();
    let singular = kind.strip_suffix('s').unwrap_or(&kind);
    let canonical = match singular.replace(' ', "").as_str() {
        "homestay" => "homestay".to_string(),
        "houseboat" => "houseboat".to_string(),
        "treehouse" => "treehouse".to_string(),
        _ => singular.to_string(),
    };
    vec![canonical]
}

fn meal_plan(caps: &Captures<'_>) -> Vec<String> {
    let Some(plan) = caps.name("plan") else {
        return Vec::new();
    };
    let plan = squash(plan.as_str()).to_lowercase().replace('&', "and").replace('-', " ");
    let plan = match plan.as_str() {
        "all meal" => "all meals".to_string(),
        "only breakfast" => "breakfast only".to_string(),
        _ => plan,
    };
    vec![format!("meal plan: {}", plan)]
}

fn flights(caps: &Captures<'_>) -> Vec<String> {
    if caps.name("no").is_some() {
        vec!["flights not required".to_string()]
    } else if caps.name("yes").is_some() {
        vec!["flights required".to_string()]
    } else {
        Vec::new()
    }
}

fn urgency(caps: &Captures<'_>) -> Vec<String> {
    if caps.name("asap").is_some() {
        return vec!["respond asap".to_string()];
    }
    if let Some(by) = caps.name("by") {
        let by = squash(by.as_str()).to_lowercase();
        let by = if by.starts_with("end of") { "eod".to_string() } else { by };
        return vec![format!("respond by {}", by)];
    }
    match caps.name("days") {
        Some(days) => vec![format!("respond within {} days", days.as_str())],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn find(text: &str) -> Vec<String> {
        let ctx = MatchContext {
            text,
            hindi: false,
            today: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            prior_reference: None,
        };
        RequirementMatcher::new()
            .unwrap()
            .find(&ctx)
            .map(|(found, _)| found)
            .unwrap_or_default()
    }

    #[test]
    fn test_hotel_class_and_property() {
        assert_eq!(find("Looking for a 4 star hotel in Goa"), ["4-star hotel"]);
        assert_eq!(find("five-star stay, water villas preferred"), ["5-star hotel", "water villa"]);
        assert_eq!(find("a houseboat night and a Home Stay in Munnar"), ["houseboat", "homestay"]);
    }

    #[test]
    fn test_meal_plan() {
        assert_eq!(find("Kerala with breakfast & dinner"), ["meal plan: breakfast and dinner"]);
        assert_eq!(find("only breakfast please"), ["meal plan: breakfast only"]);
        assert_eq!(find("all-inclusive resort"), ["meal plan: all inclusive"]);
    }

    #[test]
    fn test_flights() {
        assert_eq!(find("Flights are not required, we will drive"), ["flights not required"]);
        assert_eq!(find("Goa package without flights"), ["flights not required"]);
        assert_eq!(find("flights needed from Delhi"), ["flights required"]);
        assert_eq!(find("flights आवश्यक हैं"), ["flights required"]);
    }

    #[test]
    fn test_urgency() {
        assert_eq!(find("Please send the quote ASAP"), ["respond asap"]);
        assert_eq!(find("need the itinerary by end of day"), ["respond by eod"]);
        assert_eq!(find("kindly share options within 3 days"), ["respond within 3 days"]);
        // A trip length is not a deadline
        assert!(find("Goa within 5 days of landing").is_empty());
    }

    #[test]
    fn test_activities() {
        assert_eq!(
            find("Activities: Ubud tour, Tanah Lot temple and beach hopping."),
            ["activity: ubud tour", "activity: tanah lot temple", "activity: beach hopping"]
        );
        assert_eq!(
            find("They would like to include Gulmarg gondola and Dal lake"),
            ["activity: gulmarg gondola", "activity: dal lake"]
        );
    }

    #[test]
    fn test_plain_inquiry_has_no_requirements() {
        assert!(find("2 people, Goa trip for 5 days, budget 50k").is_empty());
    }
}
