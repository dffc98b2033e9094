//! Tallyvet — automated validation of scanned construction estimation
//! documents.
//!
//! One processing run takes a document through extraction → understanding →
//! standardization → validation → confidence scoring, producing a normalized
//! document, a validation result, a confidence score and an auditable stage
//! log. The two external services (ICR extraction and language
//! understanding) sit behind traits; every validation engine is a pure,
//! synchronous component that can be shared across concurrent runs.

pub mod config;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for embedders that do not install their own
/// subscriber. RUST_LOG wins over the built-in default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
