//! Number words in English, romanized Hindi and Devanagari
//!
//! Travelers write counts as digits ("2 people"), English words ("two
//! adults"), romanized Hindi ("do log") or Devanagari ("दो लोग"). Only small
//! cardinals are covered; budgets always use digits.

/// Convert a number word to its value
///
/// # Examples
/// ```
/// use travel_inquiry_text_processing::numbers::word_to_number;
/// assert_eq!(word_to_number("पांच"), Some(5));
/// assert_eq!(word_to_number("teen"), Some(3));
/// assert_eq!(word_to_number("Four"), Some(4));
/// ```
pub fn word_to_number(word: &str) -> Option<u32> {
    let lower = word.trim().to_lowercase();
    let value = match lower.as_str() {
        // Devanagari
        "एक" => 1,
        "दो" => 2,
        "तीन" => 3,
        "चार" => 4,
        "पांच" | "पाँच" => 5,
        "छह" | "छः" | "छे" => 6,
        "सात" => 7,
        "आठ" => 8,
        "नौ" => 9,
        "दस" => 10,
        "बारह" => 12,
        "पंद्रह" => 15,
        "बीस" => 20,

        // Romanized Hindi
        "ek" => 1,
        "do" => 2,
        "teen" => 3,
        "char" | "chaar" => 4,
        "paanch" | "panch" => 5,
        "chhe" | "chhah" => 6,
        "saat" => 7,
        "aath" => 8,
        "nau" => 9,
        "das" => 10,

        // English
        "one" | "a" | "an" | "single" => 1,
        "two" | "couple" | "pair" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" | "dozen" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        _ => return None,
    };
    Some(value)
}

/// Parse a count written as digits or a number word
pub fn parse_count(token: &str) -> Option<u32> {
    let trimmed = token.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
        return trimmed.parse().ok();
    }
    if trimmed.chars().all(|c| ('\u{0966}'..='\u{096F}').contains(&c)) && !trimmed.is_empty() {
        return devanagari_digits(trimmed);
    }
    word_to_number(trimmed)
}

/// Regex alternation of every number word, for embedding in patterns
pub fn number_word_pattern() -> &'static str {
    r"one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|ek|do|teen|chaar|char|paanch|panch|chhe|saat|aath|nau|das|एक|दो|तीन|चार|पांच|पाँच|छह|सात|आठ|नौ|दस|बारह|पंद्रह|बीस"
}

/// English-only number words; safe inside English rules where "do" is a verb
pub fn english_number_word_pattern() -> &'static str {
    r"one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty"
}

fn devanagari_digits(s: &str) -> Option<u32> {
    s.chars().try_fold(0u32, |acc, c| {
        let digit = (c as u32).checked_sub(0x0966)?;
        acc.checked_mul(10)?.checked_add(digit)
    })
}
