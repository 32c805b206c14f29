//! Main settings module

use config::{Config, Environment, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use travel_inquiry_core::{FieldName, InquiryType};

use crate::constants::{fusion, language, statistical, tiers, validation};
use crate::{ConfigError, Lexicon};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Language identification thresholds
    #[serde(default)]
    pub language: LanguageConfig,

    #[serde(default)]
    pub lexicon: Lexicon,

    /// Pattern matcher tier confidences
    #[serde(default)]
    pub pattern: PatternConfig,

    #[serde(default)]
    pub statistical: StatisticalConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageConfig {
    pub devanagari_high: f32,
    pub devanagari_low: f32,
    pub romanized_hinglish_min: f32,
    pub romanized_high: f32,
    /// Hindi words commonly written in Latin script
    pub romanized_lexicon: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            devanagari_high: language::DEVANAGARI_HIGH,
            devanagari_low: language::DEVANAGARI_LOW,
            romanized_hinglish_min: language::ROMANIZED_HINGLISH_MIN,
            romanized_high: language::ROMANIZED_HIGH,
            romanized_lexicon: default_romanized_lexicon(),
        }
    }
}

fn default_romanized_lexicon() -> Vec<String> {
    [
        "hai", "hain", "ka", "ki", "ke", "ko", "se", "mein", "mujhe", "humein", "hamare", "hamara",
        "humara", "hum", "aur", "bhi", "toh", "kya", "nahi", "nahin", "chahiye", "chahte", "chahta",
        "chahti", "karna", "karni", "kar", "karo", "kijiye", "karke", "ji", "yatra", "safar",
        "ghumna", "jana", "jaana", "liye", "tak", "wala", "wali", "log", "logon", "din", "raat",
        "paisa", "namaste", "dhanyawad", "dhanyavad", "shukriya", "accha", "acha", "theek", "jaldi",
        "abhi", "apna", "apni", "mera", "meri", "unka", "dobara", "jisme", "sath", "saath",
        "bachche", "bacche", "parivar", "jagah", "agle", "mahine", "hafte", "kuch", "kitna",
        "kitne", "batao", "bataiye", "bhej", "bhejiye", "dijiye", "rahe", "raha", "rahi", "wahan",
        "yahan", "ek", "teen", "char", "paanch",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternConfig {
    /// Exact structured match
    pub exact_confidence: f32,
    /// Lexicon or alias match
    pub fuzzy_confidence: f32,
    /// Inferred or defaulted value
    pub inferred_confidence: f32,
    pub default_currency: String,
    pub family_default_size: u32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            exact_confidence: tiers::EXACT,
            fuzzy_confidence: tiers::FUZZY,
            inferred_confidence: tiers::INFERRED,
            default_currency: "INR".to_string(),
            family_default_size: tiers::FAMILY_DEFAULT_SIZE,
        }
    }
}

/// Entity model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    #[default]
    Ollama,
    /// Always unavailable; extraction runs pattern-only
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatisticalConfig {
    pub backend: ModelBackend,
    pub endpoint: String,
    pub model: String,
    /// Upper bound on one recognition call, retries included
    pub timeout_ms: u64,
    /// Spans scored below this are discarded
    pub confidence_floor: f32,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::default(),
            endpoint: statistical::ENDPOINT.to_string(),
            model: statistical::MODEL.to_string(),
            timeout_ms: statistical::TIMEOUT_MS,
            confidence_floor: statistical::CONFIDENCE_FLOOR,
            max_retries: statistical::MAX_RETRIES,
            initial_backoff_ms: statistical::INITIAL_BACKOFF_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfig {
    pub agreement_bonus: f32,
    pub disagreement_margin: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            agreement_bonus: fusion::AGREEMENT_BONUS,
            disagreement_margin: fusion::DISAGREEMENT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Texts shorter than this lower single-leg confidence proportionally
    pub min_tokens_for_confidence: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_tokens_for_confidence: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub max_travelers: u32,
    /// Fields reported present or unknown per type
    pub required_fields: BTreeMap<InquiryType, Vec<FieldName>>,
    /// Required fields whose absence rejects the message
    pub identifying_fields: BTreeMap<InquiryType, Vec<FieldName>>,
    pub low_confidence_threshold: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let required = BTreeMap::from([
            (InquiryType::SingleLeg, vec![FieldName::Destinations]),
            (InquiryType::MultiLeg, vec![FieldName::Destinations]),
            (InquiryType::Modification, vec![FieldName::ReferenceId]),
        ]);
        Self {
            max_travelers: validation::MAX_TRAVELERS,
            identifying_fields: required.clone(),
            required_fields: required,
            low_confidence_threshold: validation::LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ValidationConfig {
    pub fn required_for(&self, inquiry_type: InquiryType) -> &[FieldName] {
        self.required_fields
            .get(&inquiry_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn identifying_for(&self, inquiry_type: InquiryType) -> &[FieldName] {
        self.identifying_fields
            .get(&inquiry_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Messages processed at once by a batch run
    pub max_concurrent_messages: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_messages: 8,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_language()?;
        self.validate_lexicon()?;
        self.validate_pattern()?;
        self.validate_statistical()?;
        self.validate_fusion()?;
        self.validate_validation()?;

        if self.pipeline.max_concurrent_messages == 0 {
            return Err(invalid("pipeline.max_concurrent_messages", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_language(&self) -> Result<(), ConfigError> {
        let lang = &self.language;
        check_unit("language.devanagari_high", lang.devanagari_high)?;
        check_unit("language.devanagari_low", lang.devanagari_low)?;
        check_unit("language.romanized_hinglish_min", lang.romanized_hinglish_min)?;
        check_unit("language.romanized_high", lang.romanized_high)?;

        if lang.devanagari_low >= lang.devanagari_high {
            return Err(invalid(
                "language.devanagari_low",
                format!(
                    "Must be below devanagari_high ({} >= {})",
                    lang.devanagari_low, lang.devanagari_high
                ),
            ));
        }
        if lang.romanized_hinglish_min >= lang.romanized_high {
            return Err(invalid(
                "language.romanized_hinglish_min",
                format!(
                    "Must be below romanized_high ({} >= {})",
                    lang.romanized_hinglish_min, lang.romanized_high
                ),
            ));
        }
        Ok(())
    }

    fn validate_lexicon(&self) -> Result<(), ConfigError> {
        let lexicon = &self.lexicon;
        Regex::new(&lexicon.booking_id_pattern).map_err(|e| {
            invalid("lexicon.booking_id_pattern", format!("Invalid regex: {}", e))
        })?;

        for phrase in &lexicon.modification_phrases {
            Regex::new(phrase).map_err(|e| {
                invalid(
                    "lexicon.modification_phrases",
                    format!("Invalid regex '{}': {}", phrase, e),
                )
            })?;
        }

        for (word, factor) in &lexicon.currency_multipliers {
            if *factor <= 0.0 {
                return Err(invalid(
                    "lexicon.currency_multipliers",
                    format!("Multiplier for '{}' must be positive, got {}", word, factor),
                ));
            }
        }

        if let Some(entry) = lexicon.gazetteer.iter().find(|e| e.name.trim().is_empty()) {
            return Err(invalid(
                "lexicon.gazetteer",
                format!("Entry with aliases {:?} has an empty name", entry.aliases),
            ));
        }
        if let Some(entry) = lexicon
            .gazetteer
            .iter()
            .find(|e| e.aliases.iter().any(|a| a.trim().is_empty()))
        {
            return Err(invalid(
                "lexicon.gazetteer",
                format!("Entry '{}' has an empty alias", entry.name),
            ));
        }

        // An empty phrase matches every message
        if lexicon.special_request_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid(
                "lexicon.special_request_phrases",
                "Phrases must not be empty",
            ));
        }
        for (tag, keywords) in &lexicon.preference_keywords {
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(invalid(
                    "lexicon.preference_keywords",
                    format!("Empty keyword for '{}'", tag),
                ));
            }
        }
        Ok(())
    }

    fn validate_pattern(&self) -> Result<(), ConfigError> {
        let pattern = &self.pattern;
        check_unit("pattern.exact_confidence", pattern.exact_confidence)?;
        check_unit("pattern.fuzzy_confidence", pattern.fuzzy_confidence)?;
        check_unit("pattern.inferred_confidence", pattern.inferred_confidence)?;

        if !(pattern.exact_confidence >= pattern.fuzzy_confidence
            && pattern.fuzzy_confidence >= pattern.inferred_confidence)
        {
            return Err(invalid(
                "pattern",
                "Tier confidences must satisfy exact >= fuzzy >= inferred",
            ));
        }
        if pattern.default_currency.trim().is_empty() {
            return Err(invalid("pattern.default_currency", "Cannot be empty"));
        }
        if pattern.family_default_size == 0 {
            return Err(invalid("pattern.family_default_size", "Must be at least 1"));
        }
        Ok(())
    }

    fn validate_statistical(&self) -> Result<(), ConfigError> {
        let stat = &self.statistical;
        check_unit("statistical.confidence_floor", stat.confidence_floor)?;

        if stat.timeout_ms == 0 {
            return Err(invalid("statistical.timeout_ms", "Must be greater than 0"));
        }
        if stat.backend == ModelBackend::Ollama && stat.endpoint.trim().is_empty() {
            return Err(invalid("statistical.endpoint", "Required for the ollama backend"));
        }
        Ok(())
    }

    fn validate_fusion(&self) -> Result<(), ConfigError> {
        let fusion = &self.fusion;
        if !(1.0..=2.0).contains(&fusion.agreement_bonus) {
            return Err(invalid(
                "fusion.agreement_bonus",
                format!("Must be between 1.0 and 2.0, got {}", fusion.agreement_bonus),
            ));
        }
        check_unit("fusion.disagreement_margin", fusion.disagreement_margin)
    }

    fn validate_validation(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if v.max_travelers == 0 {
            return Err(invalid("validation.max_travelers", "Must be at least 1"));
        }
        check_unit("validation.low_confidence_threshold", v.low_confidence_threshold)?;

        for (inquiry_type, fields) in &v.identifying_fields {
            let required = v.required_for(*inquiry_type);
            if let Some(field) = fields.iter().find(|f| !required.contains(f)) {
                return Err(invalid(
                    "validation.identifying_fields",
                    format!("{} is identifying for {} but not required", field, inquiry_type),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn check_unit(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("Must be between 0.0 and 1.0, got {}", value)))
    }
}

/// Load settings from files and environment
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.{toml,yaml,json}` (optional)
/// 2. `config/{env}` (optional)
/// 3. `TRAVEL_INQUIRY__*` environment variables
///
/// A configured `lexicon.lexicon_file` then replaces the built-in lexicon.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("TRAVEL_INQUIRY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    if let Some(path) = settings.lexicon.lexicon_file.clone() {
        let mut lexicon = Lexicon::load(&path)?;
        lexicon.lexicon_file = Some(path);
        settings.lexicon = lexicon;
    }

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use travel_inquiry_core::PreferenceTag;

    use crate::GazetteerEntry;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.validation.max_travelers, 50);
        assert_eq!(
            settings.validation.required_for(InquiryType::Modification),
            &[FieldName::ReferenceId]
        );
    }

    #[test]
    fn test_threshold_ordering_validation() {
        let mut settings = Settings::default();
        settings.language.devanagari_low = 0.7;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "language.devanagari_low"));
    }

    #[test]
    fn test_agreement_bonus_below_one_rejected() {
        let mut settings = Settings::default();
        settings.fusion.agreement_bonus = 0.9;
        assert!(settings.validate().is_err());

        settings.fusion.agreement_bonus = 1.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_bad_booking_pattern_rejected() {
        let mut settings = Settings::default();
        settings.lexicon.booking_id_pattern = "[A-Z".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_lexicon_entries_rejected() {
        let mut settings = Settings::default();
        settings.lexicon.gazetteer.push(GazetteerEntry::new("Gokarna", &["gokarn", "  "]));
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lexicon.gazetteer"));

        let mut settings = Settings::default();
        settings.lexicon.special_request_phrases.push(String::new());
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lexicon.special_request_phrases"));

        let mut settings = Settings::default();
        settings
            .lexicon
            .preference_keywords
            .entry(PreferenceTag::Beach)
            .or_default()
            .push(" ".to_string());
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lexicon.preference_keywords"));
    }

    #[test]
    fn test_identifying_must_be_required() {
        let mut settings = Settings::default();
        settings
            .validation
            .identifying_fields
            .insert(InquiryType::SingleLeg, vec![FieldName::Budget]);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "fusion:\n  disagreement_margin: 0.3\nvalidation:\n  max_travelers: 12\n  identifying_fields:\n    single_leg: []"
        )
        .unwrap();

        let settings: Settings = Config::builder()
            .add_source(File::from(file.path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.fusion.disagreement_margin, 0.3);
        assert_eq!(settings.fusion.agreement_bonus, fusion::AGREEMENT_BONUS);
        assert_eq!(settings.validation.max_travelers, 12);
        assert!(settings.validation.identifying_for(InquiryType::SingleLeg).is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_option_rejected() {
        let result: Result<FusionConfig, _> = serde_yaml::from_str("agreement_bonus: 1.2\nmargin: 0.1");
        assert!(result.is_err());
    }
}
