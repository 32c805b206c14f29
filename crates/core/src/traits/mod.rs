//! Capability traits at the extraction seams
//!
//! ```text
//! Extractor:    NormalizedText → candidate fields (pattern, statistical, ...)
//! EntityModel:  text → labelled spans (backs the statistical extractor)
//! ```
//!
//! Fusion depends only on [`Extractor`], so further strategies can be added
//! without touching it.

mod entity_model;
mod extractor;

pub use entity_model::{EntityLabel, EntityModel, EntitySpan};
pub use extractor::{ExtractionReport, Extractor};
