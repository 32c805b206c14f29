//! Fusion, classification and validation for travel inquiries
//!
//! This crate turns extractor candidates into a validated record:
//! - [`FusionEngine`]: one authoritative value per catalog field
//! - [`InquiryClassifier`]: ordered rule table over the fused record
//! - [`RecordValidator`]: range checks, leg consistency, required fields
//! - [`InquiryPipeline`]: the per-message run and the batch runner
//!
//! # Example
//!
//! ```ignore
//! use travel_inquiry_engine::InquiryPipeline;
//!
//! let pipeline = InquiryPipeline::new(&settings)?;
//! match pipeline.process(&message).await {
//!     Ok(record) => send_to_quoting(record),
//!     Err(e) if e.is_validation() => escalate(e),
//!     Err(e) => return Err(e),
//! }
//! ```

pub mod classifier;
pub mod fusion;
pub mod pipeline;
pub mod validator;

pub use classifier::{InquiryClassifier, Rule, Signals};
pub use fusion::{FusionEngine, FusionOutcome};
pub use pipeline::InquiryPipeline;
pub use validator::{RecordValidator, ValidationContext};
