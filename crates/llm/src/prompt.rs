//! Prompt building and response parsing for entity extraction
//!
//! The model is asked for a JSON object `{"entities": [...]}` whose labels
//! come from the entity contract. Responses are parsed leniently: code
//! fences and chatter around the JSON are ignored, unknown labels and blank
//! spans are dropped.

use std::fmt;
use serde::{Deserialize, Serialize};
use travel_inquiry_core::{EntityLabel, EntitySpan};

use crate::ModelError;

/// Score assumed when the model omits one
const DEFAULT_SCORE: f32 = 0.5;

const SYSTEM_PROMPT: &str = "You extract entities from travel inquiries written in English, Hindi (Devanagari or romanized) or Hinglish.
Return only a JSON object of the form {\"entities\": [{\"label\": ..., \"text\": ..., \"score\": ...}]}.
Labels:
- person: number of travelers or traveler names (\"2 people\", \"family of 4\", \"do log\")
- date: travel dates or trip length (\"10-15 May\", \"5 days\", \"next month\")
- money: budget amounts with any currency or lakh/k multiplier (\"50k\", \"₹1.5 lakh\")
- place: destinations and departure cities, in the order mentioned
- organization: companies or agencies
- preference: trip style such as honeymoon, adventure, luxury, beach, family, pilgrimage, wildlife, cultural, hill-station, budget-conscious
- request: special requests (\"wheelchair access\", \"airport pickup\")
- reference: existing booking or quote identifiers (\"AB1234\")
\"text\" must be copied exactly from the message. \"score\" is your confidence between 0 and 1.
Do not invent entities that are not in the message.";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Messages for one extraction call
pub fn extraction_messages(text: &str) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(text)]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityPayload {
    Wrapped {
        #[serde(default)]
        entities: Vec<RawEntity>,
    },
    Bare(Vec<RawEntity>),
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(alias = "type", alias = "tag")]
    label: String,
    #[serde(alias = "value", alias = "span")]
    text: String,
    #[serde(default, alias = "confidence")]
    score: Option<f32>,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// Parse a model reply into entity spans
pub fn parse_entities(content: &str) -> Result<Vec<EntitySpan>, ModelError> {
    let json = json_body(content)
        .ok_or_else(|| ModelError::InvalidResponse(format!("no JSON in reply: {}", preview(content))))?;

    let payload: EntityPayload =
        serde_json::from_str(json).map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
    let raw = match payload {
        EntityPayload::Wrapped { entities } => entities,
        EntityPayload::Bare(entities) => entities,
    };

    let mut spans = Vec::with_capacity(raw.len());
    for entity in raw {
        let Some(label) = EntityLabel::parse(&entity.label) else {
            tracing::debug!(label = %entity.label, "Dropping entity with unknown label");
            continue;
        };
        let text = entity.text.trim();
        if text.is_empty() {
            continue;
        }

        let mut span = EntitySpan::new(label, text, entity.score.unwrap_or(DEFAULT_SCORE));
        if let (Some(start), Some(end)) = (entity.start, entity.end) {
            span = span.at(start, end);
        }
        spans.push(span);
    }
    Ok(spans)
}

/// The outermost JSON object or array in a reply
fn json_body(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    let object = trimmed.find('{').zip(trimmed.rfind('}'));
    let array = trimmed.find('[').zip(trimmed.rfind(']'));

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                a
            } else {
                o
            }
        },
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    (start < end).then(|| &trimmed[start..=end])
}

fn preview(content: &str) -> String {
    content.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let messages = extraction_messages("2 people to Goa");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "2 people to Goa");
    }

    #[test]
    fn test_parse_wrapped() {
        let reply = r#"{"entities": [
            {"label": "person", "text": "2 people", "score": 0.9},
            {"label": "GPE", "text": "Goa", "score": 0.95, "start": 10, "end": 13},
            {"label": "weather", "text": "sunny", "score": 0.9},
            {"label": "money", "text": "  ", "score": 0.9}
        ]}"#;
        let spans = parse_entities(reply).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].label, EntityLabel::Person);
        assert_eq!(spans[1].label, EntityLabel::Place);
        assert_eq!(spans[1].start, Some(10));
    }

    #[test]
    fn test_parse_fenced_bare_array() {
        let reply = "Here you go:\n```json\n[{\"type\": \"money\", \"value\": \"50k\"}]\n```";
        let spans = parse_entities(reply).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].label, EntityLabel::Money);
        assert_eq!(spans[0].score, DEFAULT_SCORE);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_entities("I cannot help"), Err(ModelError::InvalidResponse(_))));
        assert!(parse_entities("{\"entities\": []}").unwrap().is_empty());
    }
}
