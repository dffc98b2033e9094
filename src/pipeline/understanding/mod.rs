pub mod client;
pub mod types;

pub use client::{MockLanguageService, RemoteNlpClient};
pub use types::LanguageService;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnderstandingError {
    #[error("Language service is not reachable at {0}")]
    Connection(String),

    #[error("Language service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed language service response: {0}")]
    MalformedResponse(String),
}
