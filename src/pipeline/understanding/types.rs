use serde_json::Value;

use super::UnderstandingError;
use crate::models::ParsedPaymentCondition;
use crate::pipeline::extraction::RawExtraction;
use crate::pipeline::standardize::Schema;

/// Language-understanding service abstraction (allows mocking).
///
/// Both operations are best-effort semantic work the pipeline cannot do
/// deterministically: mapping loosely recognized fields onto the target
/// schema, and reading payment triggers out of contract prose.
pub trait LanguageService {
    /// Map raw ICR output into the target schema's shape.
    ///
    /// The result is a loose mapping, not a validated document — the
    /// standardization stage owns coercion and schema checking.
    fn map_fields(
        &self,
        extraction: &RawExtraction,
        target_schema: &Schema,
    ) -> Result<Value, UnderstandingError>;

    /// Parse one payment-condition sentence into a structured trigger.
    fn parse_condition_text(
        &self,
        text: &str,
    ) -> Result<ParsedPaymentCondition, UnderstandingError>;
}
