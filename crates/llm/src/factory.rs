//! Entity model factory
//!
//! Builds the process-wide entity model from settings. The result is shared
//! read-only by every pipeline for the life of the process.
//!
//! ## Example
//! ```ignore
//! let model = create_entity_model(&settings.statistical)?;
//! let pipeline = InquiryPipeline::from_settings(&settings, model)?;
//! ```

use std::sync::Arc;
use travel_inquiry_config::{ModelBackend, StatisticalConfig};
use travel_inquiry_core::EntityModel;

use crate::backend::{DisabledEntityModel, OllamaEntityModel};
use crate::ModelError;

/// Create the configured entity model backend
pub fn create_entity_model(config: &StatisticalConfig) -> Result<Arc<dyn EntityModel>, ModelError> {
    match config.backend {
        ModelBackend::Ollama => {
            if config.endpoint.trim().is_empty() {
                return Err(ModelError::Configuration(
                    "Ollama backend requires an endpoint".to_string(),
                ));
            }
            tracing::info!(endpoint = %config.endpoint, model = %config.model, "Using Ollama entity model");
            Ok(Arc::new(OllamaEntityModel::new(config)?))
        },
        ModelBackend::Disabled => {
            tracing::info!("Statistical extraction disabled; running pattern-only");
            Ok(Arc::new(DisabledEntityModel))
        },
    }
}
