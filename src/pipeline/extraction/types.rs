use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ExtractionError;

/// Structured ICR output for one analyzed document.
///
/// Immutable once received: every downstream stage reads it, none write
/// back into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub pages: Vec<RawPage>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
    #[serde(default)]
    pub key_value_pairs: Vec<KeyValuePair>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One recognized page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page_number: usize,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub lines: Vec<RawLine>,
    /// Page-level recognition confidence, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// One recognized text line with its position on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLine {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounding_box: Vec<f64>,
}

/// One recognized table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub column_count: usize,
    #[serde(default)]
    pub cells: Vec<RawCell>,
}

/// One table cell. Spans default to 1 when the service omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub row_index: usize,
    #[serde(default)]
    pub column_index: usize,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_span")]
    pub row_span: usize,
    #[serde(default = "default_span")]
    pub column_span: usize,
}

fn default_span() -> usize {
    1
}

/// One recognized key/value pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// ICR extraction service abstraction (allows mocking).
pub trait ExtractionService {
    /// Analyze one document and return its structured ICR output.
    ///
    /// A failure here is pipeline-fatal for the run.
    fn analyze(&self, file_reference: &str) -> Result<RawExtraction, ExtractionError>;
}
