//! Language identification
//!
//! Script counting first: the share of word tokens containing Devanagari
//! decides Devanagari Hindi and mixed-script Hinglish. Latin-dominant text is
//! then scored against a romanized Hindi lexicon to separate English,
//! Hinglish and romanized Hindi. Confidence is the normalized distance from
//! the nearest decision threshold, so text sitting on a boundary scores 0.

use std::collections::HashSet;
use travel_inquiry_config::LanguageConfig;
use travel_inquiry_core::{LanguageProfile, PrimaryLanguage, Script};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct TokenCounts {
    devanagari: usize,
    latin: usize,
    romanized_hits: usize,
}

impl TokenCounts {
    fn total(&self) -> usize {
        self.devanagari + self.latin
    }

    fn ratio(part: usize, whole: usize) -> f32 {
        if whole == 0 {
            0.0
        } else {
            part as f32 / whole as f32
        }
    }

    fn devanagari_ratio(&self) -> f32 {
        Self::ratio(self.devanagari, self.total())
    }

    fn romanized_ratio(&self) -> f32 {
        Self::ratio(self.romanized_hits, self.latin)
    }

    /// Share of tokens in the minority language of a mixture
    fn minority_share(&self) -> f32 {
        let hindi = self.devanagari + self.romanized_hits;
        let english = self.total() - hindi;
        Self::ratio(hindi.min(english), self.total())
    }

    fn hindi_share(&self) -> f32 {
        Self::ratio(self.devanagari + self.romanized_hits, self.total())
    }
}

/// Identifies the dominant language of inquiry text
#[derive(Debug, Clone)]
pub struct LanguageIdentifier {
    config: LanguageConfig,
    romanized: HashSet<String>,
}

impl LanguageIdentifier {
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            romanized: config
                .romanized_lexicon
                .iter()
                .map(|w| w.trim().to_lowercase())
                .collect(),
            config: config.clone(),
        }
    }

    /// Classify text; never fails
    pub fn identify(&self, text: &str) -> LanguageProfile {
        let counts = self.count_tokens(text);
        if counts.total() == 0 {
            return LanguageProfile::undetermined();
        }

        let cfg = &self.config;
        let dev_ratio = counts.devanagari_ratio();
        let roman_ratio = counts.romanized_ratio();

        let profile = if dev_ratio >= cfg.devanagari_high {
            LanguageProfile::new(
                PrimaryLanguage::HindiDevanagari,
                1.0 - dev_ratio,
                above(dev_ratio, cfg.devanagari_high, 1.0),
            )
        } else if dev_ratio >= cfg.devanagari_low {
            LanguageProfile::new(
                PrimaryLanguage::Hinglish,
                counts.minority_share(),
                within(dev_ratio, cfg.devanagari_low, cfg.devanagari_high),
            )
        } else if roman_ratio >= cfg.romanized_high {
            LanguageProfile::new(
                PrimaryLanguage::HindiRomanized,
                1.0 - counts.hindi_share(),
                above(roman_ratio, cfg.romanized_high, 1.0),
            )
        } else if roman_ratio >= cfg.romanized_hinglish_min {
            LanguageProfile::new(
                PrimaryLanguage::Hinglish,
                counts.minority_share(),
                within(roman_ratio, cfg.romanized_hinglish_min, cfg.romanized_high),
            )
        } else {
            let script_margin = below(dev_ratio, cfg.devanagari_low);
            let lexicon_margin = below(roman_ratio, cfg.romanized_hinglish_min);
            LanguageProfile::new(
                PrimaryLanguage::English,
                counts.hindi_share(),
                script_margin.min(lexicon_margin),
            )
        };

        tracing::debug!(
            language = %profile.primary_language,
            confidence = profile.confidence,
            devanagari_ratio = dev_ratio,
            romanized_ratio = roman_ratio,
            "Identified language"
        );
        profile
    }

    fn count_tokens(&self, text: &str) -> TokenCounts {
        let mut counts = TokenCounts::default();
        for word in text.unicode_words() {
            let mut has_latin = false;
            let mut has_devanagari = false;
            for c in word.chars() {
                match Script::of(c) {
                    Script::Devanagari => has_devanagari = true,
                    Script::Latin => has_latin = true,
                    Script::Other => {},
                }
            }

            if has_devanagari {
                counts.devanagari += 1;
            } else if has_latin {
                counts.latin += 1;
                if self.romanized.contains(&word.to_lowercase()) {
                    counts.romanized_hits += 1;
                }
            }
        }
        counts
    }
}

/// Distance above `threshold`, scaled to the room left before `ceiling`
fn above(value: f32, threshold: f32, ceiling: f32) -> f32 {
    let room = ceiling - threshold;
    if room <= f32::EPSILON {
        return 1.0;
    }
    ((value - threshold) / room).clamp(0.0, 1.0)
}

/// Distance below `threshold`, scaled to the threshold itself
fn below(value: f32, threshold: f32) -> f32 {
    if threshold <= f32::EPSILON {
        return 1.0;
    }
    ((threshold - value) / threshold).clamp(0.0, 1.0)
}

/// Distance to the nearer edge of a band, scaled to half its width
fn within(value: f32, low: f32, high: f32) -> f32 {
    let half = (high - low) / 2.0;
    if half <= f32::EPSILON {
        return 0.0;
    }
    ((value - low).min(high - value) / half).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> LanguageIdentifier {
        LanguageIdentifier::new(&LanguageConfig::default())
    }

    #[test]
    fn test_english() {
        let profile = identifier().identify("2 people, Goa trip for 5 days, budget 50k");
        assert_eq!(profile.primary_language, PrimaryLanguage::English);
        assert!((profile.confidence - 1.0).abs() < 1e-6);
        assert_eq!(profile.mixture_ratio, 0.0);
    }

    #[test]
    fn test_devanagari() {
        let profile = identifier().identify("हमें गोवा जाना है, दो लोग, पांच दिन");
        assert_eq!(profile.primary_language, PrimaryLanguage::HindiDevanagari);
        assert!(profile.confidence > 0.9);
    }

    #[test]
    fn test_hinglish_romanized() {
        let profile = identifier().identify("Hamare client ke liye Goa ka package chahiye, 2 log, 5 din");
        assert_eq!(profile.primary_language, PrimaryLanguage::Hinglish);
        assert!(profile.mixture_ratio > 0.0);
    }

    #[test]
    fn test_mixed_script_is_hinglish() {
        let profile = identifier().identify("Please book Goa trip, हम दो लोग हैं and budget 50k");
        assert_eq!(profile.primary_language, PrimaryLanguage::Hinglish);
    }

    #[test]
    fn test_romanized_hindi() {
        let profile = identifier().identify("mujhe aur mera parivar ko jaldi yatra karni hai");
        assert_eq!(profile.primary_language, PrimaryLanguage::HindiRomanized);
    }

    #[test]
    fn test_empty_and_symbols_undetermined() {
        for text in ["", "   ", "@@@ ### 123 !!!"] {
            let profile = identifier().identify(text);
            assert_eq!(profile.primary_language, PrimaryLanguage::English);
            assert_eq!(profile.confidence, 0.0);
        }
    }

    #[test]
    fn test_boundary_confidence_is_zero() {
        let mut config = LanguageConfig::default();
        config.romanized_hinglish_min = 0.5;
        config.romanized_high = 0.9;
        // one hit out of two Latin tokens sits exactly on the Hinglish threshold
        let profile = LanguageIdentifier::new(&config).identify("Goa chahiye");
        assert_eq!(profile.primary_language, PrimaryLanguage::Hinglish);
        assert_eq!(profile.confidence, 0.0);
    }
}
