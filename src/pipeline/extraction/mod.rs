pub mod client;
pub mod types;

pub use client::{MockExtractionService, RemoteIcrClient};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction service is not reachable at {0}")]
    Connection(String),

    #[error("Extraction service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),
}
