use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative schema tree.
///
/// Exactly the reduced feature set the validator implements: `type`,
/// `properties`, `required`, `enum`, `minimum`/`maximum`, `items`. No
/// external schema language is assumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Result of validating a document against a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Structural validator over the reduced schema tree.
///
/// Errors accumulate: validation always returns the full error set, never
/// stopping at the first problem.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, data: &Value, schema: &Schema) -> SchemaReport {
        let mut errors = Vec::new();

        if let Some(object) = data.as_object() {
            // Required fields apply at this object's own level only; nested
            // schemas declare their own `required` when they need it.
            for field in &schema.required {
                if !object.contains_key(field) {
                    errors.push(format!("missing required field: {field}"));
                }
            }

            for (field, field_schema) in &schema.properties {
                if let Some(value) = object.get(field) {
                    self.validate_field(field, value, field_schema, &mut errors);
                }
            }

            // Enum membership is checked independently of type checks; a
            // field can fail one, the other, or both.
            for (field, field_schema) in &schema.properties {
                let (Some(value), Some(allowed)) =
                    (object.get(field), field_schema.allowed.as_ref())
                else {
                    continue;
                };
                if !allowed.contains(value) {
                    errors.push(format!(
                        "field '{field}' value {value} is not in the allowed set"
                    ));
                }
            }
        }

        let is_valid = errors.is_empty();
        if is_valid {
            tracing::debug!("schema validation passed");
        } else {
            tracing::warn!(error_count = errors.len(), "schema validation failed");
        }
        SchemaReport { is_valid, errors }
    }

    fn validate_field(
        &self,
        name: &str,
        value: &Value,
        schema: &Schema,
        errors: &mut Vec<String>,
    ) {
        if let Some(expected) = schema.kind.as_deref() {
            if !type_matches(value, expected) {
                errors.push(format!(
                    "field '{name}' has wrong type: expected {expected}, got {}",
                    kind_of(value)
                ));
            }
        }

        // Range checks apply to any numeric value when bounds are present,
        // independent of the declared type.
        if let Some(actual) = value.as_f64() {
            if let Some(minimum) = schema.minimum {
                if actual < minimum {
                    errors.push(format!("field '{name}' is below the minimum {minimum}"));
                }
            }
            if let Some(maximum) = schema.maximum {
                if actual > maximum {
                    errors.push(format!("field '{name}' is above the maximum {maximum}"));
                }
            }
        }

        if let (Value::Array(entries), Some(item_schema)) = (value, schema.items.as_deref()) {
            for (index, entry) in entries.iter().enumerate() {
                self.validate_field(&format!("{name}[{index}]"), entry, item_schema, errors);
            }
        }

        if let Some(object) = value.as_object() {
            for (property, property_schema) in &schema.properties {
                if let Some(property_value) = object.get(property) {
                    self.validate_field(
                        &format!("{name}.{property}"),
                        property_value,
                        property_schema,
                        errors,
                    );
                }
            }
        }
    }

    /// Basic structural sanity check, independent of any declared schema.
    pub fn validate_document_structure(&self, data: &Value) -> SchemaReport {
        let mut errors = Vec::new();

        match data.as_object() {
            None => errors.push("document data is not an object".to_string()),
            Some(object) => {
                if object.is_empty() {
                    errors.push("document data is empty".to_string());
                }
                for field in ["document_type", "document_id"] {
                    if !object.contains_key(field) {
                        errors.push(format!("missing base field: {field}"));
                    }
                }
            }
        }

        SchemaReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Map a schema type name onto the JSON kinds it accepts.
///
/// An unrecognized type name constrains nothing — deliberate forward
/// compatibility, not a gap.
fn type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    fn validator() -> SchemaValidator {
        SchemaValidator::new()
    }

    #[test]
    fn missing_required_field_is_always_named() {
        let s = schema(json!({
            "type": "object",
            "required": ["document_id"],
            "properties": {"document_id": {"type": "string"}, "note": {"type": "string"}},
        }));
        let report = validator().validate(&json!({"note": "fine"}), &s);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("document_id")));
    }

    #[test]
    fn type_and_enum_checks_are_independent() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "document_type": {"type": "string", "enum": ["estimation", "payment"]},
            },
        }));
        // Wrong type AND outside the enum: both errors reported.
        let report = validator().validate(&json!({"document_type": 7}), &s);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.contains("wrong type")));
        assert!(report.errors.iter().any(|e| e.contains("allowed set")));
    }

    #[test]
    fn unknown_schema_type_constrains_nothing() {
        let s = schema(json!({
            "type": "object",
            "properties": {"blob": {"type": "decimal128"}},
        }));
        let report = validator().validate(&json!({"blob": "anything"}), &s);
        assert!(report.is_valid);
    }

    #[test]
    fn number_accepts_integers_but_integer_rejects_floats() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "period_amount": {"type": "number"},
                "period_number": {"type": "integer"},
            },
        }));

        let ok = validator().validate(&json!({"period_amount": 3, "period_number": 2}), &s);
        assert!(ok.is_valid);

        let bad = validator().validate(&json!({"period_number": 2.5}), &s);
        assert!(!bad.is_valid);
    }

    #[test]
    fn range_checks_apply_to_numeric_values_regardless_of_declared_type() {
        let s = schema(json!({
            "type": "object",
            "properties": {"contract_amount": {"type": "string", "minimum": 0}},
        }));
        let report = validator().validate(&json!({"contract_amount": -5}), &s);
        // Type error plus range error, both present.
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.contains("below the minimum")));
    }

    #[test]
    fn nested_array_errors_carry_the_index() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"amount": {"type": "number"}}},
                },
            },
        }));
        let report = validator().validate(
            &json!({"items": [{"amount": 10}, {"amount": "ten"}]}),
            &s,
        );
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("items[1].amount")));
    }

    #[test]
    fn validation_never_stops_at_the_first_error() {
        let s = schema(json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {"c": {"type": "number"}},
        }));
        let report = validator().validate(&json!({"c": "not a number"}), &s);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn document_structure_check_requires_base_fields() {
        let report = validator().validate_document_structure(&json!({"document_type": "estimation"}));
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("document_id")));

        let empty = validator().validate_document_structure(&json!({}));
        assert!(empty.errors.iter().any(|e| e.contains("empty")));
    }
}
