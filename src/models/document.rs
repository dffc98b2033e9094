use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::condition::ParsedPaymentCondition;
use super::decimal;
use super::enums::DocumentType;

/// Schema version stamped on every normalized document.
pub const NORMALIZED_SCHEMA_VERSION: &str = "1.0";

/// Canonical, typed form of one extracted document.
///
/// Produced once per processing run by the normalizer and never mutated
/// afterwards; the validators only read it. Fields the upstream mapping
/// supplied but this model does not know survive in `extra` verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub document_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_info: Option<ContractInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub period_amount: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub previous_accumulation: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub current_accumulation: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_conditions: Vec<PaymentConditionEntry>,
    pub normalized_at: DateTime<Utc>,
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedDocument {
    /// Empty document of the given type, stamped with the current time and
    /// schema version.
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            document_id: None,
            period_number: None,
            contract_info: None,
            items: Vec::new(),
            period_amount: None,
            previous_accumulation: None,
            current_accumulation: None,
            payment_conditions: Vec::new(),
            normalized_at: Utc::now(),
            version: NORMALIZED_SCHEMA_VERSION.to_string(),
            extra: Map::new(),
        }
    }
}

/// Contract terms attached to an estimation document.
///
/// `current_total_amount` is the post-change ceiling from the newer document
/// layout; `contract_amount` is the original ceiling. Resolution prefers the
/// newer field when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub contract_amount: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub current_total_amount: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of the estimation detail table.
///
/// `amount ≈ quantity × unit_price` is checked by the amount engine, not
/// enforced at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub unit_price: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub amount: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub previous_quantity: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal::opt_amount")]
    pub total_quantity: Option<BigDecimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payment condition as carried on the document: free text, an
/// already-parsed structure, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentConditionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_condition: Option<ParsedPaymentCondition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn amounts_serialize_as_json_numbers() {
        let mut doc = NormalizedDocument::new(DocumentType::Estimation);
        doc.document_id = Some("EST-2024-001".into());
        doc.period_amount = Some(BigDecimal::from_str("1234.56").unwrap());

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["document_type"], json!("estimation"));
        assert!(value["period_amount"].is_number());
        assert!((value["period_amount"].as_f64().unwrap() - 1234.56).abs() < 0.001);
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let doc = NormalizedDocument::new(DocumentType::Estimation);
        let value = serde_json::to_value(&doc).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("document_id"));
        assert!(!object.contains_key("items"));
        assert!(!object.contains_key("current_accumulation"));
    }

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let raw = json!({
            "document_type": "estimation",
            "normalized_at": "2024-03-01T00:00:00Z",
            "version": "1.0",
            "site_office": "northern district",
        });

        let doc: NormalizedDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.extra["site_office"], json!("northern district"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["site_office"], json!("northern district"));
    }

    #[test]
    fn line_item_decimal_fields_deserialize_from_numbers() {
        let item: LineItem = serde_json::from_value(json!({
            "item_no": "1",
            "description": "concrete",
            "quantity": 10.0,
            "unit_price": 250.5,
            "amount": 2505.0,
        }))
        .unwrap();

        assert_eq!(item.quantity, Some(BigDecimal::from_str("10").unwrap()));
        assert_eq!(item.unit_price, Some(BigDecimal::from_str("250.5").unwrap()));
    }
}
