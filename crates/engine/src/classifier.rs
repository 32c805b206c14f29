//! Inquiry classification
//!
//! A fixed, ordered rule table decides the inquiry type from the fused
//! record and lexical signals in the text. Rules are tried by priority and
//! the first that fires wins:
//!
//! | Priority | Rule         | Type         | Fires on                                       |
//! |----------|--------------|--------------|------------------------------------------------|
//! | 1        | modification | modification | reference_id present, or modification phrases  |
//! | 2        | multi_leg    | multi_leg    | ≥2 destinations, "day 1 / day 2", dated legs   |
//! | 3        | single_leg   | single_leg   | always                                         |
//!
//! Classification is a pure function of its inputs.

use std::collections::BTreeSet;
use regex::Regex;
use travel_inquiry_config::{ClassifierConfig, Lexicon};
use travel_inquiry_core::{FieldName, FusedRecord, InquiryClassification, InquiryType, NormalizedText};
use travel_inquiry_text_processing::DateParser;

/// Signal prefix for modification phrases found in the text
pub const MODIFICATION_LEXICON_SIGNAL: &str = "modification_lexicon:";

const DAY_SEGMENTATION_CONFIDENCE: f32 = 0.85;
const DATED_LEGS_CONFIDENCE: f32 = 0.8;
/// Added per corroborating multi-leg signal
const CORROBORATION_STEP: f32 = 0.05;

/// Catalog fields whose presence makes a single-leg reading credible
const COVERAGE_FULL: f32 = 4.0;

/// Everything the rules look at, computed once per message
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub reference_confidence: Option<f32>,
    /// Distinct modification phrases, lowercased
    pub modification_phrases: Vec<String>,
    pub destination_count: usize,
    pub destination_confidence: f32,
    pub day_segments: usize,
    pub dated_legs: usize,
    pub field_count: usize,
    pub token_count: usize,
}

type Evaluate = fn(&Signals, &ClassifierConfig) -> Option<(f32, BTreeSet<String>)>;

/// One row of the rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub priority: u8,
    pub name: &'static str,
    pub inquiry_type: InquiryType,
    evaluate: Evaluate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("priority", &self.priority)
            .field("name", &self.name)
            .field("inquiry_type", &self.inquiry_type)
            .finish()
    }
}

static RULES: [Rule; 3] = [
    Rule {
        priority: 1,
        name: "modification",
        inquiry_type: InquiryType::Modification,
        evaluate: modification_rule,
    },
    Rule {
        priority: 2,
        name: "multi_leg",
        inquiry_type: InquiryType::MultiLeg,
        evaluate: multi_leg_rule,
    },
    Rule {
        priority: 3,
        name: "single_leg",
        inquiry_type: InquiryType::SingleLeg,
        evaluate: single_leg_rule,
    },
];

fn modification_rule(signals: &Signals, _config: &ClassifierConfig) -> Option<(f32, BTreeSet<String>)> {
    let mut reasons = BTreeSet::new();
    let mut confidence: f32 = 0.0;

    if let Some(reference) = signals.reference_confidence {
        reasons.insert("reference_id_present".to_string());
        confidence = confidence.max(reference);
    }

    if !signals.modification_phrases.is_empty() {
        for phrase in &signals.modification_phrases {
            reasons.insert(format!("{}{}", MODIFICATION_LEXICON_SIGNAL, phrase));
        }
        let hits = i32::try_from(signals.modification_phrases.len()).unwrap_or(i32::MAX);
        confidence = confidence.max(1.0 - 0.5f32.powi(hits));
    }

    (!reasons.is_empty()).then_some((confidence, reasons))
}

fn multi_leg_rule(signals: &Signals, _config: &ClassifierConfig) -> Option<(f32, BTreeSet<String>)> {
    let mut fired: Vec<(&str, f32)> = Vec::new();
    if signals.destination_count > 1 {
        fired.push(("destinations_count>1", signals.destination_confidence));
    }
    if signals.day_segments > 1 {
        fired.push(("day_segmentation", DAY_SEGMENTATION_CONFIDENCE));
    }
    if signals.dated_legs > 1 {
        fired.push(("dated_legs>1", DATED_LEGS_CONFIDENCE));
    }

    let strongest = fired.iter().map(|(_, c)| *c).reduce(f32::max)?;
    let confidence = strongest + CORROBORATION_STEP * (fired.len() - 1) as f32;
    Some((
        confidence.min(1.0),
        fired.into_iter().map(|(name, _)| name.to_string()).collect(),
    ))
}

fn single_leg_rule(signals: &Signals, config: &ClassifierConfig) -> Option<(f32, BTreeSet<String>)> {
    let mut reasons = BTreeSet::new();
    reasons.insert(format!("destinations_count={}", signals.destination_count));

    let destination_factor = if signals.destination_count == 1 {
        signals.destination_confidence
    } else {
        0.0
    };
    let coverage = (signals.field_count as f32 / COVERAGE_FULL).min(1.0);
    let length = if config.min_tokens_for_confidence == 0 {
        1.0
    } else {
        (signals.token_count as f32 / config.min_tokens_for_confidence as f32).min(1.0)
    };

    if signals.field_count == 0 {
        reasons.insert("no_fields_extracted".to_string());
    }
    if signals.token_count < config.min_tokens_for_confidence {
        reasons.insert("text_too_short".to_string());
    }

    let confidence = 0.5 * destination_factor + 0.3 * coverage + 0.2 * length;
    Some((confidence, reasons))
}

/// Rule-table classifier
#[derive(Debug)]
pub struct InquiryClassifier {
    config: ClassifierConfig,
    modification: Vec<Regex>,
    day_segment: Regex,
    clause_split: Regex,
    dates: DateParser,
}

impl InquiryClassifier {
    pub fn new(config: &ClassifierConfig, lexicon: &Lexicon) -> travel_inquiry_core::Result<Self> {
        let modification = lexicon
            .modification_phrases
            .iter()
            .map(|phrase| {
                Regex::new(&format!("(?im){}", phrase)).map_err(|e| {
                    travel_inquiry_core::Error::Config(format!("Invalid modification phrase '{}': {}", phrase, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let day_segment = Regex::new(r"(?i)\b(?:day|din)\s*[-#]?\s*([0-9]{1,2})\b|दिन\s*([0-9]{1,2})")
            .map_err(|e| travel_inquiry_core::Error::Config(e.to_string()))?;

        let clause_split = Regex::new(r"(?i)[\n;,]|\b(?:then|phir|fir)\b|फिर")
            .map_err(|e| travel_inquiry_core::Error::Config(e.to_string()))?;

        Ok(Self {
            config: config.clone(),
            modification,
            day_segment,
            clause_split,
            dates: DateParser::new()?,
        })
    }

    /// The rule table in evaluation order
    pub fn rules(&self) -> &'static [Rule] {
        &RULES
    }

    pub fn classify(&self, record: &FusedRecord, text: &NormalizedText) -> InquiryClassification {
        let signals = self.signals(record, text);

        for rule in &RULES {
            if let Some((confidence, reasons)) = (rule.evaluate)(&signals, &self.config) {
                tracing::debug!(
                    rule = rule.name,
                    priority = rule.priority,
                    confidence,
                    signals = ?reasons,
                    "Classification rule fired"
                );
                return InquiryClassification::new(rule.inquiry_type, confidence, reasons);
            }
        }

        // The last rule always fires
        InquiryClassification::new(InquiryType::SingleLeg, 0.0, Vec::<String>::new())
    }

    /// Compute the rule inputs
    pub fn signals(&self, record: &FusedRecord, text: &NormalizedText) -> Signals {
        let destinations = record.get(FieldName::Destinations);
        Signals {
            reference_confidence: record.get(FieldName::ReferenceId).map(|f| f.confidence),
            modification_phrases: self.modification_phrases(text.as_str()),
            destination_count: record.destinations().len(),
            destination_confidence: destinations.map_or(0.0, |f| f.confidence),
            day_segments: self.day_segments(text.as_str()),
            dated_legs: self.dated_legs(record.destinations(), text),
            field_count: record.len(),
            token_count: text.token_count(),
        }
    }

    fn modification_phrases(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for regex in &self.modification {
            if let Some(m) = regex.find(text) {
                let phrase = m.as_str().trim().to_lowercase();
                if !phrase.is_empty() && !found.contains(&phrase) {
                    found.push(phrase);
                }
            }
        }
        found
    }

    /// Distinct day numbers in "day 1 / day 2" style segmentation
    fn day_segments(&self, text: &str) -> usize {
        self.day_segment
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Destinations that own a dated clause of their own
    ///
    /// Clauses are split at line breaks, commas, semicolons and "then";
    /// a clause counts when it holds a date and exactly one destination.
    fn dated_legs(&self, destinations: &[String], text: &NormalizedText) -> usize {
        if destinations.len() < 2 {
            return 0;
        }
        let reference = text.reference_date;
        let names: Vec<String> = destinations.iter().map(|d| d.to_lowercase()).collect();

        let mut anchored = BTreeSet::new();
        for clause in self.clause_split.split(text.as_str()) {
            if self.dates.all_dates(clause, reference).is_empty() {
                continue;
            }
            let lower = clause.to_lowercase();
            let mut named = names.iter().enumerate().filter(|(_, name)| lower.contains(name.as_str()));
            if let (Some((i, _)), None) = (named.next(), named.next()) {
                anchored.insert(i);
            }
        }
        anchored.len()
    }
}
