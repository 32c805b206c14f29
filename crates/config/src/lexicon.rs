//! Extraction lexicons
//!
//! Gazetteer, currency multipliers, modification phrases, preference
//! keywords and special-request phrases. Defaults are built in; a YAML file
//! named by `lexicon_file` replaces them wholesale (missing keys fall back to
//! the defaults).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use travel_inquiry_core::PreferenceTag;

use crate::ConfigError;

/// A known place and its alternate spellings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GazetteerEntry {
    /// Canonical name reported in records
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl GazetteerEntry {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Lexicon {
    /// Optional YAML file replacing the built-in lexicon
    pub lexicon_file: Option<String>,

    /// Magnitude words and their factors ("lakh" → 100000)
    pub currency_multipliers: BTreeMap<String, f64>,

    pub gazetteer: Vec<GazetteerEntry>,

    /// Regex sources, matched case-insensitively
    pub modification_phrases: Vec<String>,

    pub preference_keywords: BTreeMap<PreferenceTag, Vec<String>>,

    pub special_request_phrases: Vec<String>,

    /// Shape of a booking reference, matched case-sensitively
    pub booking_id_pattern: String,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            lexicon_file: None,
            currency_multipliers: default_currency_multipliers(),
            gazetteer: default_gazetteer(),
            modification_phrases: default_modification_phrases(),
            preference_keywords: default_preference_keywords(),
            special_request_phrases: default_special_request_phrases(),
            booking_id_pattern: default_booking_id_pattern(),
        }
    }
}

impl Lexicon {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Get currency multiplier by word
    pub fn currency_multiplier(&self, word: &str) -> Option<f64> {
        self.currency_multipliers
            .get(&word.to_lowercase())
            .or_else(|| self.currency_multipliers.get(word))
            .copied()
    }

    /// Canonical name for a place spelling, if known
    pub fn canonical_place(&self, spelling: &str) -> Option<&str> {
        let needle = spelling.trim();
        self.gazetteer
            .iter()
            .find(|entry| {
                entry.name.eq_ignore_ascii_case(needle)
                    || entry.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
            })
            .map(|entry| entry.name.as_str())
    }
}

fn default_currency_multipliers() -> BTreeMap<String, f64> {
    [
        ("k", 1e3),
        ("thousand", 1e3),
        ("hazar", 1e3),
        ("hazaar", 1e3),
        ("हज़ार", 1e3),
        ("हजार", 1e3),
        ("l", 1e5),
        ("lakh", 1e5),
        ("lakhs", 1e5),
        ("lac", 1e5),
        ("lacs", 1e5),
        ("लाख", 1e5),
        ("million", 1e6),
        ("cr", 1e7),
        ("crore", 1e7),
        ("crores", 1e7),
        ("करोड़", 1e7),
        ("करोड", 1e7),
    ]
    .into_iter()
    .map(|(word, factor)| (word.to_string(), factor))
    .collect()
}

fn default_gazetteer() -> Vec<GazetteerEntry> {
    vec![
        // India
        GazetteerEntry::new("Goa", &["गोवा"]),
        GazetteerEntry::new("Delhi", &["New Delhi", "दिल्ली", "नई दिल्ली"]),
        GazetteerEntry::new("Agra", &["आगरा"]),
        GazetteerEntry::new("Jaipur", &["जयपुर"]),
        GazetteerEntry::new("Udaipur", &["उदयपुर"]),
        GazetteerEntry::new("Jodhpur", &["जोधपुर"]),
        GazetteerEntry::new("Jaisalmer", &[]),
        GazetteerEntry::new("Rajasthan", &["राजस्थान"]),
        GazetteerEntry::new("Mumbai", &["Bombay", "मुंबई"]),
        GazetteerEntry::new("Pune", &[]),
        GazetteerEntry::new("Ahmedabad", &["अहमदाबाद"]),
        GazetteerEntry::new("Lucknow", &["लखनऊ"]),
        GazetteerEntry::new("Chandigarh", &["चंडीगढ़"]),
        GazetteerEntry::new("Indore", &[]),
        GazetteerEntry::new("Bhopal", &[]),
        GazetteerEntry::new("Bengaluru", &["Bangalore", "बेंगलुरु"]),
        GazetteerEntry::new("Mysore", &["Mysuru"]),
        GazetteerEntry::new("Coorg", &["Kodagu"]),
        GazetteerEntry::new("Hampi", &[]),
        GazetteerEntry::new("Chikmagalur", &[]),
        GazetteerEntry::new("Karnataka", &[]),
        GazetteerEntry::new("Chennai", &["Madras", "चेन्नई"]),
        GazetteerEntry::new("Ooty", &["Ootacamund"]),
        GazetteerEntry::new("Kodaikanal", &[]),
        GazetteerEntry::new("Rameswaram", &[]),
        GazetteerEntry::new("Kanyakumari", &[]),
        GazetteerEntry::new("Tamil Nadu", &[]),
        GazetteerEntry::new("Kerala", &["केरल"]),
        GazetteerEntry::new("Munnar", &["मुन्नार"]),
        GazetteerEntry::new("Alleppey", &["Alappuzha"]),
        GazetteerEntry::new("Kochi", &["Cochin"]),
        GazetteerEntry::new("Hyderabad", &["हैदराबाद"]),
        GazetteerEntry::new("Tirupati", &[]),
        GazetteerEntry::new("Vizag", &["Visakhapatnam"]),
        GazetteerEntry::new("Araku", &[]),
        GazetteerEntry::new("Kolkata", &["Calcutta", "कोलकाता"]),
        GazetteerEntry::new("Darjeeling", &[]),
        GazetteerEntry::new("Sikkim", &["Gangtok"]),
        GazetteerEntry::new("Varanasi", &["Banaras", "Benares", "वाराणसी"]),
        GazetteerEntry::new("Amritsar", &["अमृतसर"]),
        GazetteerEntry::new("Himachal Pradesh", &["Himachal"]),
        GazetteerEntry::new("Manali", &["मनाली"]),
        GazetteerEntry::new("Shimla", &["Simla", "शिमला"]),
        GazetteerEntry::new("Dharamshala", &["Dharamsala", "McLeod Ganj"]),
        GazetteerEntry::new("Kashmir", &["कश्मीर"]),
        GazetteerEntry::new("Srinagar", &[]),
        GazetteerEntry::new("Ladakh", &["Leh", "लद्दाख"]),
        GazetteerEntry::new("Uttarakhand", &[]),
        GazetteerEntry::new("Rishikesh", &["ऋषिकेश"]),
        GazetteerEntry::new("Haridwar", &["हरिद्वार"]),
        GazetteerEntry::new("Nainital", &[]),
        GazetteerEntry::new("Mussoorie", &[]),
        GazetteerEntry::new("Andaman", &["Andaman and Nicobar", "Port Blair", "Havelock"]),
        // International
        GazetteerEntry::new("Bali", &["बाली"]),
        GazetteerEntry::new("Singapore", &["सिंगापुर"]),
        GazetteerEntry::new("Dubai", &["दुबई"]),
        GazetteerEntry::new("Abu Dhabi", &[]),
        GazetteerEntry::new("Maldives", &["मालदीव"]),
        GazetteerEntry::new("Mauritius", &[]),
        GazetteerEntry::new("Sri Lanka", &[]),
        GazetteerEntry::new("Nepal", &["Kathmandu"]),
        GazetteerEntry::new("Bhutan", &[]),
        GazetteerEntry::new("Thailand", &["थाईलैंड"]),
        GazetteerEntry::new("Bangkok", &[]),
        GazetteerEntry::new("Phuket", &[]),
        GazetteerEntry::new("Pattaya", &[]),
        GazetteerEntry::new("Krabi", &[]),
        GazetteerEntry::new("Malaysia", &["Kuala Lumpur"]),
        GazetteerEntry::new("Vietnam", &[]),
        GazetteerEntry::new("Cambodia", &[]),
        GazetteerEntry::new("Japan", &["Tokyo"]),
        GazetteerEntry::new("Korea", &["South Korea", "Seoul"]),
        GazetteerEntry::new("Europe", &[]),
        GazetteerEntry::new("London", &[]),
        GazetteerEntry::new("Paris", &[]),
        GazetteerEntry::new("Rome", &[]),
        GazetteerEntry::new("Switzerland", &[]),
        GazetteerEntry::new("Austria", &[]),
        GazetteerEntry::new("Amsterdam", &[]),
        GazetteerEntry::new("USA", &["United States"]),
        GazetteerEntry::new("Canada", &[]),
        GazetteerEntry::new("Australia", &[]),
        GazetteerEntry::new("New Zealand", &[]),
        GazetteerEntry::new("South Africa", &[]),
    ]
}

fn default_modification_phrases() -> Vec<String> {
    [
        r"\b(?:modify|modification|amend|amendment|reschedule)\b",
        r"\bchange(?:s|d)?\b",
        r"\bupdate(?:d)?\s+(?:my|our|the)\s+(?:booking|quote|quotation|itinerary|reservation)\b",
        r"\b(?:previous|existing|earlier|original)\s+(?:booking|quote|quotation|itinerary|reservation)\b",
        r"\bresend\s+(?:the\s+)?updated\b",
        r"\bincreas(?:e|ing)\s+the\s+number\b",
        r"\badd\s+(?:one|two|three|\d+)\s+more\s+(?:traveler|traveller|person|people|adult|child|kid|pax)s?\b",
        r"\b(?:would|we'd|i'd)\s+like\s+to\s+(?:add|change|modify|update)\b",
        r"^re:\s*.*\b(?:trip|quote|quotation|booking|itinerary|travel)\b",
        r"\bbadal(?:na|ni|ne|av)?\b",
        r"\bbadlav\b",
        r"बदल",
        r"संशोधन",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_preference_keywords() -> BTreeMap<PreferenceTag, Vec<String>> {
    let table: [(PreferenceTag, &[&str]); 10] = [
        (PreferenceTag::Honeymoon, &["honeymoon", "romantic", "newly married", "newlywed", "हनीमून"]),
        (
            PreferenceTag::Adventure,
            &["adventure", "trekking", "trek", "rafting", "paragliding", "scuba", "snorkeling", "snorkelling", "bungee", "camping", "skiing"],
        ),
        (
            PreferenceTag::BudgetConscious,
            &["budget-friendly", "budget friendly", "cheap", "affordable", "economical", "low budget", "sasta", "sasti", "kam budget", "किफायती"],
        ),
        (PreferenceTag::Luxury, &["luxury", "luxurious", "5-star", "5 star", "five star", "premium", "private villa"]),
        (PreferenceTag::Family, &["family", "kids", "children", "parivar", "bachche", "परिवार"]),
        (PreferenceTag::Beach, &["beach", "beaches", "seaside", "samundar", "समुद्र"]),
        (PreferenceTag::HillStation, &["hill station", "hills", "mountains", "snowfall", "pahad", "पहाड़"]),
        (PreferenceTag::Pilgrimage, &["pilgrimage", "temple", "darshan", "mandir", "tirth", "char dham", "मंदिर", "तीर्थ"]),
        (PreferenceTag::Wildlife, &["wildlife", "safari", "jungle", "national park", "tiger reserve"]),
        (PreferenceTag::Cultural, &["heritage", "culture", "cultural", "forts", "palaces", "museum", "sightseeing"]),
    ];
    table
        .into_iter()
        .map(|(tag, words)| (tag, words.iter().map(|w| w.to_string()).collect()))
        .collect()
}

fn default_special_request_phrases() -> Vec<String> {
    [
        "wheelchair access",
        "wheelchair",
        "airport pickup",
        "airport drop",
        "airport transfer",
        "airport transfers",
        "birthday cake",
        "anniversary cake",
        "romantic setup",
        "room decoration",
        "honeymoon decoration",
        "candle light dinner",
        "candlelight dinner",
        "visa assistance",
        "travel insurance",
        "vegetarian food",
        "veg food",
        "jain food",
        "early check-in",
        "late checkout",
        "late check-out",
        "extra bed",
        "baby cot",
        "sea facing room",
        "sea view room",
        "private pool",
        "व्हीलचेयर",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_booking_id_pattern() -> String {
    r"\b[A-Z]{2,4}-?\d{3,8}\b".to_string()
}
