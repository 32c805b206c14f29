//! Message types at the pipeline boundary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inquiry as delivered by the mail collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub body: String,
    #[serde(default)]
    pub subject: Option<String>,
    /// Used for audit only
    #[serde(default)]
    pub sender: Option<String>,
    /// Threading token from the mail system, if any
    #[serde(default)]
    pub prior_reference: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl RawMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_prior_reference(mut self, reference: impl Into<String>) -> Self {
        self.prior_reference = Some(reference.into());
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    /// Subject and body joined for extraction, subject first
    pub fn extraction_text(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => format!("{}\n{}", subject, self.body),
            _ => self.body.clone(),
        }
    }
}

/// Canonical cleaned text of one message
///
/// Extractor spans are byte offsets into `text`. Relative dates ("next
/// month", "this weekend") resolve against `reference_date`, which is fixed
/// once per message so every stage sees the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    #[serde(default)]
    pub prior_reference: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default = "today")]
    pub reference_date: NaiveDate,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Default for NormalizedText {
    fn default() -> Self {
        Self::new("")
    }
}

impl NormalizedText {
    /// Text with no hints; relative dates resolve against today
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prior_reference: None,
            received_at: None,
            reference_date: today(),
        }
    }

    /// Pin the date relative expressions resolve against
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Text covered by a byte span, if the span is valid
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        self.text.get(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_text_prepends_subject() {
        let msg = RawMessage::new("2 people to Goa").with_subject("Trip enquiry");
        assert_eq!(msg.extraction_text(), "Trip enquiry\n2 people to Goa");

        let blank = RawMessage::new("body only").with_subject("   ");
        assert_eq!(blank.extraction_text(), "body only");
    }

    #[test]
    fn test_raw_message_deserializes_with_body_only() {
        let msg: RawMessage = serde_json::from_str(r#"{"body": "hello"}"#).unwrap();
        assert_eq!(msg.body, "hello");
        assert!(msg.subject.is_none());
        assert!(msg.received_at.is_none());
    }

    #[test]
    fn test_normalized_slice() {
        let text = NormalizedText::new("Goa trip");
        assert_eq!(text.slice(0, 3), Some("Goa"));
        assert_eq!(text.slice(0, 99), None);
        assert_eq!(text.token_count(), 2);
    }

    #[test]
    fn test_reference_date_pinned() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
        let text = NormalizedText::new("Goa next month").with_reference_date(date);
        assert_eq!(text.reference_date, date);
        assert!(text.received_at.is_none());

        let decoded: NormalizedText = serde_json::from_str(r#"{"text": "Goa"}"#).unwrap();
        assert_eq!(decoded.text, "Goa");
        assert!(decoded.prior_reference.is_none());
    }
}
