//! Entity model backends
//!
//! `OllamaEntityModel` posts the extraction prompt to a local Ollama server
//! and parses the JSON reply. Transient failures (network, 5xx, timeout) are
//! retried with doubling backoff; 4xx and unparseable replies are not.
//!
//! `DisabledEntityModel` never answers. It stands in when no model is
//! configured so the pipeline runs pattern-only.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use travel_inquiry_config::StatisticalConfig;
use travel_inquiry_core::{EntityModel, EntitySpan, Error, Result};

use crate::prompt::{extraction_messages, parse_entities, Message};
use crate::ModelError;

/// Ollama-served LLM doing entity recognition
///
/// Cheap to clone; `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct OllamaEntityModel {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl OllamaEntityModel {
    pub fn new(config: &StatisticalConfig) -> std::result::Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ModelError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.endpoint, path)
    }

    /// One extraction call with retries; returns the reply text
    pub async fn chat(&self, messages: &[Message]) -> std::result::Result<String, ModelError> {
        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            format: Some("json".to_string()),
            options: Some(OllamaOptions {
                temperature: Some(0.0),
            }),
        };

        let mut last_error = None;
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max_retries = self.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Model request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response.message.content),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ModelError::Network("Max retries exceeded".to_string())))
    }

    async fn execute_request(
        &self,
        request: &OllamaChatRequest,
    ) -> std::result::Result<OllamaChatResponse, ModelError> {
        let response = self.client.post(self.api_url("/chat")).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(ModelError::Network(format!("Server error {}: {}", status, error)));
            }
            return Err(ModelError::Api(format!("{}: {}", status, error)));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &ModelError) -> bool {
        matches!(error, ModelError::Network(_) | ModelError::Timeout)
    }
}

#[async_trait]
impl EntityModel for OllamaEntityModel {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let reply = self.chat(&extraction_messages(text)).await?;
        let spans = parse_entities(&reply)?;
        tracing::debug!(model = %self.model, spans = spans.len(), "Model recognized entities");
        Ok(spans)
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Backend used when statistical extraction is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEntityModel;

#[async_trait]
impl EntityModel for DisabledEntityModel {
    async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        Err(Error::ModelUnavailable("statistical backend is disabled".to_string()))
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}
