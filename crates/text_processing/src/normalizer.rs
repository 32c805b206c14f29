//! Message text normalization
//!
//! Turns a raw email body into the canonical string every extractor reads:
//! - repairs common UTF-8-as-Latin-1 mis-decodes and typographic punctuation
//! - collapses runs of spaces and tabs, trims every line
//! - drops `>` quoted lines and cuts at reply attributions ("On ... wrote:")
//! - cuts signature blocks after a short dashed separator near the end
//! - collapses blank-line runs
//!
//! Normalization is idempotent: `normalize_text(normalize_text(x)) ==
//! normalize_text(x)`. A single pass can expose new work (collapsing `Â\t`
//! to `Â ` creates a repairable sequence), so passes repeat until the text
//! stops changing.

use chrono::{NaiveDate, Utc};
use travel_inquiry_core::{NormalizedText, RawMessage};

/// Mis-decoded sequences and their repairs
const ENCODING_REPAIRS: &[(&str, &str)] = &[
    ("\r\n", "\n"),
    ("\r", "\n"),
    ("â‚¹", "₹"),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¼", "ü"),
    ("Â£", "£"),
    ("Â°", "°"),
    ("Â\u{a0}", " "),
    ("Â ", " "),
    ("\u{a0}", " "),
    ("\u{200b}", ""),
    ("\u{feff}", ""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("\u{2026}", "..."),
];

/// Lines after a separator that still count as a signature
const SIGNATURE_WINDOW: usize = 6;

/// Text normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    signature_window: usize,
    /// Clock used for messages without a received timestamp
    reference_date: Option<NaiveDate>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            signature_window: SIGNATURE_WINDOW,
            reference_date: None,
        }
    }

    pub fn with_signature_window(mut self, lines: usize) -> Self {
        self.signature_window = lines;
        self
    }

    /// Pin the fallback clock instead of reading today's date per message
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Normalize a message; the subject is prepended to the body
    ///
    /// The reference date for relative expressions is resolved here, once:
    /// the received day if known, else the pinned or current date.
    pub fn normalize(&self, message: &RawMessage) -> NormalizedText {
        let text = self.normalize_text(&message.extraction_text());
        tracing::debug!(
            raw_len = message.body.len(),
            normalized_len = text.len(),
            "Normalized message text"
        );
        NormalizedText {
            text,
            prior_reference: message
                .prior_reference
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from),
            received_at: message.received_at,
            reference_date: message
                .received_at
                .map(|at| at.date_naive())
                .or(self.reference_date)
                .unwrap_or_else(|| Utc::now().date_naive()),
        }
    }

    /// Canonicalize a string
    pub fn normalize_text(&self, raw: &str) -> String {
        let mut text = self.normalize_pass(raw);
        // No pass grows the text or creates `\r`, tabs or `…`, so this ends
        loop {
            let next = self.normalize_pass(&text);
            if next == text {
                return text;
            }
            text = next;
        }
    }

    fn normalize_pass(&self, raw: &str) -> String {
        let repaired = repair_encoding(raw);

        let lines: Vec<String> = repaired
            .split('\n')
            .map(collapse_whitespace)
            .filter(|line| !line.starts_with('>'))
            .collect();

        let kept = self.strip_reply_and_signature(lines);
        join_collapsing_blanks(&kept)
    }

    fn strip_reply_and_signature(&self, lines: Vec<String>) -> Vec<String> {
        let mut kept = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();

            if is_reply_attribution(&lower) {
                tracing::debug!(line = index, "Cutting quoted reply");
                break;
            }

            if is_device_signature(&lower) {
                tracing::debug!(line = index, "Cutting device signature");
                break;
            }

            if is_separator(line) {
                let remaining = lines[index + 1..]
                    .iter()
                    .filter(|l| !l.is_empty())
                    .count();
                if remaining <= self.signature_window {
                    tracing::debug!(line = index, remaining, "Cutting signature block");
                    break;
                }
                // Decorative divider in the middle of the message
                continue;
            }

            kept.push(line.clone());
        }

        kept
    }
}

/// Apply the repair table until nothing matches; chained mis-decodes
/// (`ÂÂÂ `) unwrap one layer per pass
fn repair_encoding(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let mut next = text.clone();
        for (bad, good) in ENCODING_REPAIRS {
            if next.contains(bad) {
                next = next.replace(bad, good);
            }
        }
        if next == text {
            return text;
        }
        text = next;
    }
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_reply_attribution(lower: &str) -> bool {
    lower.ends_with("wrote:")
        || lower.ends_with("ने लिखा:")
        || (lower.contains("original message") && lower.starts_with("--"))
}

fn is_device_signature(lower: &str) -> bool {
    lower.starts_with("sent from my ")
        || lower.starts_with("sent from outlook")
        || lower.starts_with("get outlook for ")
}

fn is_separator(line: &str) -> bool {
    line.chars().count() >= 2 && line.chars().all(|c| matches!(c, '-' | '_' | '='))
}

fn join_collapsing_blanks(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn norm(text: &str) -> String {
        Normalizer::new().normalize_text(text)
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(norm("  2   people,\tGoa  \n\n\n\nbudget 50k  "), "2 people, Goa\n\nbudget 50k");
    }

    #[test]
    fn test_repairs_encoding() {
        assert_eq!(norm("budget â‚¹50,000 â€“ canâ€™t exceed"), "budget ₹50,000 - can't exceed");
        assert_eq!(norm("Caf\u{e9}\u{a0}stay \u{201c}Goa\u{201d}"), "Café stay \"Goa\"");
    }

    #[test]
    fn test_strips_quoted_reply() {
        let body = "Please add one more traveler.\n\nOn Mon, 3 Mar 2025 at 10:00, Agent <a@x.com> wrote:\n> Here is your quote\n> Regards";
        assert_eq!(norm(body), "Please add one more traveler.");
    }

    #[test]
    fn test_drops_inline_quotes() {
        assert_eq!(norm("> old text\nnew text\n> more old"), "new text");
    }

    #[test]
    fn test_cuts_signature() {
        let body = "Goa trip for 2\n\n--\nRahul Sharma\nAcme Travels\n+91 98xxxxxx";
        assert_eq!(norm(body), "Goa trip for 2");

        let device = "Goa trip\nSent from my iPhone";
        assert_eq!(norm(device), "Goa trip");
    }

    #[test]
    fn test_keeps_mid_message_divider_content() {
        let body = "Leg one: Delhi\n----\nLeg two: Agra\na\nb\nc\nd\ne\nf\ng";
        let out = norm(body);
        assert!(out.contains("Leg two: Agra"));
        assert!(!out.contains("----"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "  2 people ,  Goa\r\n\r\n\r\nbudget â‚¹ 50k\n--\nsig",
            "From: me\n> quoted\nSent: now\n----\nx\ny\nz\nw\nv\nu\nt",
            "नमस्ते,\n\nहमें गोवा जाना है\n\nOn Tue someone wrote:\n> hi",
            "",
            "\u{feff}\u{200b}  ",
            "ÃÃ©© â€â€™™",
            "Trip toÂ\tGoa",
            "Trip toÂ\nGoa",
            "Trip toÂ\u{2003}Goa",
            "Â\r\nÂ\u{3000}x",
        ];
        for sample in samples {
            let once = norm(sample);
            assert_eq!(norm(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_idempotent_with_mixed_whitespace() {
        let spaces = [" ", "\t", "\n", "\u{a0}", "\u{2003}", "\r\n", "\u{3000}"];
        for (bad, _) in ENCODING_REPAIRS {
            for ws in spaces {
                for sample in [
                    format!("Trip to{bad}{ws}Goa"),
                    format!("{ws}{bad}{ws}x"),
                    format!("Trip to{ws}{bad}Goa{ws}"),
                ] {
                    let once = norm(&sample);
                    assert_eq!(norm(&once), once, "not idempotent for {:?}", sample);
                }
            }
        }
    }

    #[test]
    fn test_whitespace_exposed_mis_decode_repaired() {
        assert_eq!(norm("Trip toÂ\tGoa"), "Trip to Goa");
        assert_eq!(norm("Trip toÂ\u{2003}Goa"), "Trip to Goa");
        assert_eq!(norm("Trip toÂÂÂÂÂÂ Goa"), "Trip to Goa");
    }

    #[test]
    fn test_normalize_message_carries_hints() {
        let msg = RawMessage::new("Change dates please")
            .with_subject("Re: Goa trip")
            .with_prior_reference("  TRV1234 ");
        let normalized = Normalizer::new().normalize(&msg);
        assert_eq!(normalized.text, "Re: Goa trip\nChange dates please");
        assert_eq!(normalized.prior_reference.as_deref(), Some("TRV1234"));
    }

    #[test]
    fn test_reference_date_resolved_once() {
        let pinned = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
        let normalizer = Normalizer::new().with_reference_date(pinned);

        let undated = normalizer.normalize(&RawMessage::new("Goa next month"));
        assert_eq!(undated.reference_date, pinned);

        let received = Utc.with_ymd_and_hms(2025, 12, 20, 23, 0, 0).unwrap();
        let dated = normalizer.normalize(&RawMessage::new("Goa next month").with_received_at(received));
        assert_eq!(dated.reference_date, NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
    }
}
