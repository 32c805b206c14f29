//! Entity recognition model contract
//!
//! A model receives text and returns labelled spans with a [0,1] score. How
//! the model works is not part of the contract; the adapter in the
//! statistical extractor maps labels onto the field catalog.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Entity classes a model may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    /// Traveler names or counts
    Person,
    Date,
    Money,
    Place,
    Organization,
    Preference,
    Request,
    Reference,
}

impl EntityLabel {
    /// Map a model-native tag onto a label
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "person" | "per" | "people" | "traveler" | "travelers" | "traveler_count" => Some(Self::Person),
            "date" | "time" | "duration" | "travel_dates" => Some(Self::Date),
            "money" | "budget" | "currency" | "amount" => Some(Self::Money),
            "place" | "loc" | "location" | "gpe" | "destination" | "city" => Some(Self::Place),
            "organization" | "org" | "company" => Some(Self::Organization),
            "preference" | "preferences" | "trip_type" => Some(Self::Preference),
            "request" | "special_request" | "special_requests" => Some(Self::Request),
            "reference" | "reference_id" | "booking_id" | "booking_reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

/// One recognized span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: EntityLabel,
    pub text: String,
    pub score: f32,
    /// Byte offset, when the model reports one
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl EntitySpan {
    pub fn new(label: EntityLabel, text: impl Into<String>, score: f32) -> Self {
        Self {
            label,
            text: text.into(),
            score: score.clamp(0.0, 1.0),
            start: None,
            end: None,
        }
    }

    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Model-backed entity recognizer
///
/// One instance is built at startup and shared read-only by every pipeline,
/// so implementations must allow concurrent calls.
#[async_trait]
pub trait EntityModel: Send + Sync {
    /// Recognize entities; fails with `Error::ModelUnavailable` when the
    /// backend cannot be reached
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;

    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;
}
