use serde::Serialize;
use serde_json::Value;

use super::types::LanguageService;
use super::UnderstandingError;
use crate::config;
use crate::models::ParsedPaymentCondition;
use crate::pipeline::extraction::RawExtraction;
use crate::pipeline::standardize::Schema;

/// HTTP client for a remote language-understanding endpoint.
pub struct RemoteNlpClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RemoteNlpClient {
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

    /// Client against the default understanding endpoint.
    pub fn default_local() -> Self {
        Self::new(
            config::DEFAULT_UNDERSTANDING_ENDPOINT,
            config::DEFAULT_SERVICE_TIMEOUT_SECS,
        )
    }

    fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::blocking::Response, UnderstandingError> {
        let url = format!("{}{path}", self.base_url);

        let response = self.client.post(&url).json(body).send().map_err(|e| {
            if e.is_connect() {
                UnderstandingError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                UnderstandingError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                UnderstandingError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UnderstandingError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

/// Request body for POST /map-fields
#[derive(Serialize)]
struct MapFieldsRequest<'a> {
    extraction: &'a RawExtraction,
    target_schema: &'a Schema,
}

/// Request body for POST /parse-condition
#[derive(Serialize)]
struct ParseConditionRequest<'a> {
    text: &'a str,
}

impl LanguageService for RemoteNlpClient {
    fn map_fields(
        &self,
        extraction: &RawExtraction,
        target_schema: &Schema,
    ) -> Result<Value, UnderstandingError> {
        tracing::info!(pages = extraction.pages.len(), "requesting field mapping");
        let body = MapFieldsRequest {
            extraction,
            target_schema,
        };
        self.post("/map-fields", &body)?
            .json::<Value>()
            .map_err(|e| UnderstandingError::MalformedResponse(e.to_string()))
    }

    fn parse_condition_text(
        &self,
        text: &str,
    ) -> Result<ParsedPaymentCondition, UnderstandingError> {
        tracing::debug!(text, "requesting condition parse");
        let body = ParseConditionRequest { text };
        self.post("/parse-condition", &body)?
            .json::<ParsedPaymentCondition>()
            .map_err(|e| UnderstandingError::MalformedResponse(e.to_string()))
    }
}

/// Canned language service for tests and offline runs.
pub struct MockLanguageService {
    mapping: Value,
    condition: Option<ParsedPaymentCondition>,
}

impl MockLanguageService {
    pub fn new(mapping: Value) -> Self {
        Self {
            mapping,
            condition: None,
        }
    }

    /// Also answer condition parses with a fixed result.
    pub fn with_condition(mut self, condition: ParsedPaymentCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl LanguageService for MockLanguageService {
    fn map_fields(
        &self,
        _extraction: &RawExtraction,
        _target_schema: &Schema,
    ) -> Result<Value, UnderstandingError> {
        Ok(self.mapping.clone())
    }

    fn parse_condition_text(
        &self,
        text: &str,
    ) -> Result<ParsedPaymentCondition, UnderstandingError> {
        Ok(self
            .condition
            .clone()
            .unwrap_or_else(|| ParsedPaymentCondition::unknown(text)))
    }
}
