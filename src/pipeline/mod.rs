pub mod confidence;
pub mod extraction;
pub mod processor;
pub mod standardize;
pub mod understanding;
pub mod validation;

use thiserror::Error;

/// Errors that terminate a document run.
///
/// Everything here is a processing fault: service outages, unusable
/// upstream payloads, internal serialization problems. Business-rule
/// violations are never errors — they surface as `fail` check results.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] extraction::ExtractionError),

    #[error("Understanding failed: {0}")]
    Understanding(#[from] understanding::UnderstandingError),

    #[error("Field mapping is unusable: {0}")]
    InvalidMapping(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
