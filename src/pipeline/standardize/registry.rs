use serde_json::json;

use super::schema::Schema;
use crate::models::DocumentType;

/// Immutable schema lookup, built once per process and shared read-only
/// across concurrent runs.
///
/// Document types without a registered schema fall back to the
/// estimation-payment default.
pub struct SchemaRegistry {
    estimation: Schema,
    contract: Schema,
}

impl SchemaRegistry {
    /// Registry with the built-in schema set.
    pub fn builtin() -> Self {
        Self {
            estimation: estimation_payment_schema(),
            contract: contract_info_schema(),
        }
    }

    /// Schema for a document type.
    pub fn get(&self, document_type: DocumentType) -> &Schema {
        match document_type {
            DocumentType::Contract => &self.contract,
            DocumentType::Estimation | DocumentType::Payment | DocumentType::Other => {
                &self.estimation
            }
        }
    }

    /// The fallback schema for unregistered types.
    pub fn default_schema(&self) -> &Schema {
        &self.estimation
    }
}

/// Schema for estimation/payment statements: header fields, the line-item
/// table, period totals and payment conditions.
fn estimation_payment_schema() -> Schema {
    serde_json::from_value(json!({
        "type": "object",
        "required": ["document_type", "document_id"],
        "properties": {
            "document_type": {
                "type": "string",
                "description": "document category",
                "enum": ["estimation", "payment", "contract", "other"],
            },
            "document_id": {"type": "string", "description": "document number"},
            "period_number": {"type": "integer", "description": "billing period ordinal"},
            "contract_info": {
                "type": "object",
                "properties": {
                    "contract_number": {"type": "string"},
                    "contract_name": {"type": "string"},
                    "contract_amount": {"type": "number", "minimum": 0},
                    "current_total_amount": {"type": "number", "minimum": 0},
                    "contractor": {"type": "string"},
                    "owner": {"type": "string"},
                    "start_date": {"type": "string", "format": "date"},
                    "end_date": {"type": "string", "format": "date"},
                    "payment_terms": {"type": "string"},
                },
            },
            "items": {
                "type": "array",
                "description": "line-item detail table",
                "items": {
                    "type": "object",
                    "properties": {
                        "item_no": {"type": "string"},
                        "description": {"type": "string"},
                        "unit": {"type": "string"},
                        "quantity": {"type": "number"},
                        "unit_price": {"type": "number"},
                        "amount": {"type": "number"},
                        "previous_quantity": {"type": "number"},
                        "total_quantity": {"type": "number"},
                        "remarks": {"type": "string"},
                    },
                },
            },
            "period_amount": {"type": "number", "description": "current period total"},
            "previous_accumulation": {"type": "number", "description": "prior cumulative total"},
            "current_accumulation": {"type": "number", "description": "cumulative total incl. this period"},
            "payment_conditions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "condition_text": {"type": "string"},
                        "parsed_condition": {"type": "object"},
                    },
                },
            },
            "validation_results": {"type": "object"},
            "confidence_scores": {"type": "object"},
            "metadata": {"type": "object"},
        },
    }))
    .expect("builtin estimation schema is well-formed")
}

/// Schema for standalone contract documents.
fn contract_info_schema() -> Schema {
    serde_json::from_value(json!({
        "type": "object",
        "required": ["contract_number"],
        "properties": {
            "contract_number": {"type": "string", "description": "contract number"},
            "contract_name": {"type": "string"},
            "contract_amount": {"type": "number", "minimum": 0, "description": "contract ceiling"},
            "current_total_amount": {"type": "number", "minimum": 0, "description": "post-change ceiling"},
            "contractor": {"type": "string"},
            "owner": {"type": "string"},
            "start_date": {"type": "string", "format": "date"},
            "end_date": {"type": "string", "format": "date"},
            "payment_terms": {"type": "string", "description": "free-text payment terms"},
        },
    }))
    .expect("builtin contract schema is well-formed")
}
