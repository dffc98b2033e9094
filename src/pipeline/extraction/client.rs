use serde::Serialize;

use super::types::{ExtractionService, RawExtraction, RawLine, RawPage};
use super::ExtractionError;
use crate::config;

/// HTTP client for a remote ICR extraction endpoint.
pub struct RemoteIcrClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RemoteIcrClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client against the default extraction endpoint.
    pub fn default_local() -> Self {
        Self::new(
            config::DEFAULT_EXTRACTION_ENDPOINT,
            config::DEFAULT_SERVICE_TIMEOUT_SECS,
        )
    }
}

/// Request body for POST /analyze
#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    file_reference: &'a str,
}

impl ExtractionService for RemoteIcrClient {
    fn analyze(&self, file_reference: &str) -> Result<RawExtraction, ExtractionError> {
        let url = format!("{}/analyze", self.base_url);
        let body = AnalyzeRequest { file_reference };

        tracing::info!(file_reference, "requesting ICR analysis");

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ExtractionError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ExtractionError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                ExtractionError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RawExtraction>()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
    }
}

/// In-memory extraction service for tests and offline runs.
pub struct MockExtractionService {
    result: RawExtraction,
}

impl MockExtractionService {
    pub fn new(result: RawExtraction) -> Self {
        Self { result }
    }

    /// A single-page result carrying the given text and page confidence.
    pub fn with_text(text: &str, confidence: f64) -> Self {
        let page = RawPage {
            page_number: 1,
            lines: vec![RawLine {
                content: text.to_string(),
                bounding_box: Vec::new(),
            }],
            confidence: Some(confidence),
            ..RawPage::default()
        };
        Self::new(RawExtraction {
            pages: vec![page],
            raw_text: text.to_string(),
            ..RawExtraction::default()
        })
    }
}

impl ExtractionService for MockExtractionService {
    fn analyze(&self, file_reference: &str) -> Result<RawExtraction, ExtractionError> {
        tracing::debug!(file_reference, "mock extraction");
        Ok(self.result.clone())
    }
}
