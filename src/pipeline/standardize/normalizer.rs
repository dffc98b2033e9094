use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::models::decimal;
use crate::models::{ContractInfo, DocumentType, LineItem, NormalizedDocument, PaymentConditionEntry};

/// Candidate date formats, tried in order; the first match wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%Y%m%d"];

/// Currency markers stripped before numeric parsing. `NT$` must come
/// before `$` so the prefix strips whole.
const CURRENCY_MARKERS: &[&str] = &["NT$", "$", "元"];

/// Numeric field names recognized on a line item.
const ITEM_AMOUNT_FIELDS: &[&str] = &[
    "quantity",
    "unit_price",
    "amount",
    "previous_quantity",
    "total_quantity",
];

/// A normalized document plus the data-quality warnings produced on the way.
#[derive(Debug, Clone)]
pub struct NormalizedOutcome {
    pub document: NormalizedDocument,
    pub warnings: Vec<String>,
}

/// Coerces heterogeneous raw field values into canonical types.
///
/// Normalization never fails: a value that cannot be coerced falls back to
/// a defined default plus a warning, so the pipeline keeps moving on noisy
/// input.
#[derive(Debug, Clone, Default)]
pub struct DataNormalizer;

impl DataNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one mapped document.
    ///
    /// Known fields are coerced to their canonical types; unknown fields
    /// survive verbatim in the document's `extra` map.
    pub fn normalize_document(
        &self,
        raw: &Value,
        document_type: DocumentType,
    ) -> NormalizedOutcome {
        tracing::info!(document_type = document_type.as_str(), "normalizing document");

        let mut warnings = Vec::new();
        let mut document = NormalizedDocument::new(document_type);

        let Some(object) = raw.as_object() else {
            warnings.push("mapped data is not an object; producing an empty document".to_string());
            tracing::warn!("mapped data is not an object");
            return NormalizedOutcome { document, warnings };
        };

        for (key, value) in object {
            match key.as_str() {
                // The caller-selected document type wins over upstream text.
                "document_type" => {}
                "document_id" => document.document_id = Some(self.normalize_identifier(value)),
                "period_number" => {
                    document.period_number = integer_field(value);
                    if document.period_number.is_none() && !value.is_null() {
                        warnings.push(format!("period_number '{value}' is not an integer"));
                    }
                }
                "contract_info" => {
                    document.contract_info = self.normalize_contract_info(value, &mut warnings);
                }
                "items" => document.items = self.normalize_items(value, &mut warnings),
                "period_amount" | "previous_accumulation" | "current_accumulation" => {
                    let amount = self.normalize_amount_field(value, key, &mut warnings);
                    match key.as_str() {
                        "period_amount" => document.period_amount = Some(amount),
                        "previous_accumulation" => document.previous_accumulation = Some(amount),
                        _ => document.current_accumulation = Some(amount),
                    }
                }
                "payment_conditions" => {
                    document.payment_conditions =
                        self.normalize_payment_conditions(value, &mut warnings);
                }
                "date" => {
                    document
                        .extra
                        .insert(key.clone(), Value::String(self.normalize_date(value)));
                }
                _ => {
                    document.extra.insert(key.clone(), value.clone());
                }
            }
        }

        tracing::info!(warning_count = warnings.len(), "document normalization completed");
        NormalizedOutcome { document, warnings }
    }

    /// Coerce one raw value to a decimal amount.
    ///
    /// Strings lose thousands separators and currency markers first.
    /// Unparseable input yields 0 plus a warning — pipeline continuation is
    /// deliberately favored over hard failure.
    pub fn normalize_amount(&self, value: &Value) -> Option<BigDecimal> {
        match value {
            Value::Number(n) => decimal::from_number(n),
            Value::String(s) => {
                let mut cleaned = s.replace(',', "");
                for marker in CURRENCY_MARKERS {
                    cleaned = cleaned.replace(marker, "");
                }
                BigDecimal::from_str(cleaned.trim()).ok()
            }
            _ => None,
        }
    }

    fn normalize_amount_field(
        &self,
        value: &Value,
        field: &str,
        warnings: &mut Vec<String>,
    ) -> BigDecimal {
        match self.normalize_amount(value) {
            Some(amount) => amount,
            None => {
                warnings.push(format!("could not parse amount '{value}' for {field}; defaulting to 0"));
                tracing::warn!(field, raw = %value, "unparseable amount defaulted to 0");
                BigDecimal::zero()
            }
        }
    }

    /// Normalize a date to ISO `YYYY-MM-DD`.
    ///
    /// An unrecognized format is returned unchanged (not an error) so the
    /// schema validator can flag it explicitly downstream.
    pub fn normalize_date(&self, value: &Value) -> String {
        let Value::String(s) = value else {
            return value.to_string();
        };

        let trimmed = s.trim();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return date.format("%Y-%m-%d").to_string();
            }
        }

        tracing::warn!(raw = %s, "unrecognized date format left unchanged");
        s.clone()
    }

    /// Uppercase, trim, and strip everything outside `[A-Z0-9-]`.
    pub fn normalize_identifier(&self, value: &Value) -> String {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        raw.trim()
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
            .collect()
    }

    fn normalize_contract_info(
        &self,
        value: &Value,
        warnings: &mut Vec<String>,
    ) -> Option<ContractInfo> {
        let Some(object) = value.as_object() else {
            warnings.push("contract_info is not an object; dropped".to_string());
            return None;
        };

        let mut info = ContractInfo::default();
        for (key, value) in object {
            match key.as_str() {
                "contract_number" => {
                    info.contract_number = Some(self.normalize_identifier(value));
                }
                "contract_amount" => {
                    info.contract_amount =
                        Some(self.normalize_amount_field(value, key, warnings));
                }
                "current_total_amount" => {
                    info.current_total_amount =
                        Some(self.normalize_amount_field(value, key, warnings));
                }
                "start_date" => info.start_date = Some(self.normalize_date(value)),
                "end_date" => info.end_date = Some(self.normalize_date(value)),
                "contract_name" | "contractor" | "owner" | "payment_terms" => {
                    match string_field(value) {
                        Some(text) => match key.as_str() {
                            "contract_name" => info.contract_name = Some(text),
                            "contractor" => info.contractor = Some(text),
                            "owner" => info.owner = Some(text),
                            _ => info.payment_terms = Some(text),
                        },
                        None => {
                            info.extra.insert(key.clone(), value.clone());
                        }
                    }
                }
                _ => {
                    info.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Some(info)
    }

    fn normalize_items(&self, value: &Value, warnings: &mut Vec<String>) -> Vec<LineItem> {
        let Some(entries) = value.as_array() else {
            warnings.push("items is not an array; dropped".to_string());
            return Vec::new();
        };

        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Some(object) = entry.as_object() else {
                warnings.push(format!("items[{index}] is not an object; skipped"));
                continue;
            };

            let mut item = LineItem::default();
            for (key, value) in object {
                if ITEM_AMOUNT_FIELDS.contains(&key.as_str()) {
                    let amount = self.normalize_amount_field(
                        value,
                        &format!("items[{index}].{key}"),
                        warnings,
                    );
                    match key.as_str() {
                        "quantity" => item.quantity = Some(amount),
                        "unit_price" => item.unit_price = Some(amount),
                        "amount" => item.amount = Some(amount),
                        "previous_quantity" => item.previous_quantity = Some(amount),
                        _ => item.total_quantity = Some(amount),
                    }
                    continue;
                }

                match key.as_str() {
                    "item_no" => item.item_no = string_field(value),
                    "description" => item.description = string_field(value),
                    "unit" => item.unit = string_field(value),
                    _ => {
                        item.extra.insert(key.clone(), value.clone());
                    }
                }
            }
            items.push(item);
        }
        items
    }

    fn normalize_payment_conditions(
        &self,
        value: &Value,
        warnings: &mut Vec<String>,
    ) -> Vec<PaymentConditionEntry> {
        let Some(entries) = value.as_array() else {
            warnings.push("payment_conditions is not an array; dropped".to_string());
            return Vec::new();
        };

        let mut conditions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                warnings.push(format!("payment_conditions[{index}] is not an object; skipped"));
                continue;
            }
            match serde_json::from_value::<PaymentConditionEntry>(entry.clone()) {
                Ok(condition) => conditions.push(condition),
                Err(e) => {
                    warnings.push(format!("payment_conditions[{index}] is malformed: {e}"));
                }
            }
        }
        conditions
    }

    /// Drop null-valued keys, and with `recursive` also null entries inside
    /// nested objects and lists. Used ahead of steps that reject nulls.
    pub fn remove_null_values(&self, data: &Value, recursive: bool) -> Value {
        match data {
            Value::Object(map) => {
                let mut cleaned = Map::new();
                for (key, value) in map {
                    if value.is_null() {
                        continue;
                    }
                    if recursive && (value.is_object() || value.is_array()) {
                        cleaned.insert(key.clone(), self.remove_null_values(value, true));
                    } else {
                        cleaned.insert(key.clone(), value.clone());
                    }
                }
                Value::Object(cleaned)
            }
            Value::Array(entries) if recursive => Value::Array(
                entries
                    .iter()
                    .filter(|entry| !entry.is_null())
                    .map(|entry| self.remove_null_values(entry, true))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Accept a string as-is; render bare numbers (`1` → "1"); reject the rest.
fn string_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integer_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalizer() -> DataNormalizer {
        DataNormalizer::new()
    }

    // ── Amounts ─────────────────────────────────────────────────────

    #[test]
    fn amount_strips_separators_and_currency_markers() {
        let n = normalizer();
        for raw in [json!("1,234.56"), json!("NT$1,234.56"), json!("$1,234.56"), json!("1234.56元")] {
            let amount = n.normalize_amount(&raw).unwrap();
            assert_eq!(amount, BigDecimal::from_str("1234.56").unwrap(), "raw: {raw}");
        }
    }

    #[test]
    fn amount_accepts_native_numbers() {
        let n = normalizer();
        assert_eq!(n.normalize_amount(&json!(250)).unwrap(), BigDecimal::from(250));
        assert_eq!(
            n.normalize_amount(&json!(0.5)).unwrap(),
            BigDecimal::from_str("0.5").unwrap()
        );
    }

    #[test]
    fn amount_round_trips_through_formatting_noise() {
        let n = normalizer();
        let original = BigDecimal::from_str("98765.43").unwrap();
        let formatted = json!("NT$98,765.43");
        let back = n.normalize_amount(&formatted).unwrap();
        assert!((&original - &back).abs() <= BigDecimal::from_str("0.01").unwrap());
    }

    #[test]
    fn unparseable_amount_defaults_to_zero_with_warning() {
        let n = normalizer();
        let outcome = n.normalize_document(
            &json!({"period_amount": "about twelve thousand"}),
            DocumentType::Estimation,
        );
        assert_eq!(outcome.document.period_amount, Some(BigDecimal::zero()));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("period_amount"));
    }

    // ── Dates ───────────────────────────────────────────────────────

    #[test]
    fn all_candidate_date_formats_normalize_to_iso() {
        let n = normalizer();
        for raw in ["2024-03-01", "2024/03/01", "2024.03.01", "2024年03月01日", "20240301"] {
            assert_eq!(n.normalize_date(&json!(raw)), "2024-03-01", "raw: {raw}");
        }
    }

    #[test]
    fn unpadded_date_components_still_parse() {
        let n = normalizer();
        assert_eq!(n.normalize_date(&json!("2024/3/1")), "2024-03-01");
    }

    #[test]
    fn unrecognized_date_is_returned_unchanged() {
        let n = normalizer();
        assert_eq!(n.normalize_date(&json!("next March")), "next March");
    }

    // ── Identifiers ─────────────────────────────────────────────────

    #[test]
    fn identifier_uppercases_and_strips_noise() {
        let n = normalizer();
        assert_eq!(n.normalize_identifier(&json!("  est-2024/001 ")), "EST-2024001");
        assert_eq!(n.normalize_identifier(&json!(90210)), "90210");
    }

    // ── Documents ───────────────────────────────────────────────────

    #[test]
    fn nested_items_are_normalized_and_unknown_fields_survive() {
        let n = normalizer();
        let outcome = n.normalize_document(
            &json!({
                "document_id": "est-7",
                "items": [
                    {"item_no": 1, "description": "rebar", "quantity": "2,000", "unit_price": 15, "amount": "NT$30,000", "remarks": "phase one"},
                ],
                "site_office": "northern district",
            }),
            DocumentType::Estimation,
        );

        assert!(outcome.warnings.is_empty());
        let doc = &outcome.document;
        assert_eq!(doc.document_id.as_deref(), Some("EST-7"));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].item_no.as_deref(), Some("1"));
        assert_eq!(doc.items[0].quantity, Some(BigDecimal::from(2000)));
        assert_eq!(doc.items[0].amount, Some(BigDecimal::from(30000)));
        assert_eq!(doc.items[0].extra["remarks"], json!("phase one"));
        assert_eq!(doc.extra["site_office"], json!("northern district"));
    }

    #[test]
    fn contract_info_fields_are_coerced() {
        let n = normalizer();
        let outcome = n.normalize_document(
            &json!({
                "contract_info": {
                    "contract_number": "ct 2023/114",
                    "contract_amount": "NT$10,000,000",
                    "start_date": "2023年01月15日",
                    "contractor": "Formosa Civil Works",
                    "bid_round": 2,
                },
            }),
            DocumentType::Estimation,
        );

        let info = outcome.document.contract_info.unwrap();
        assert_eq!(info.contract_number.as_deref(), Some("CT2023114"));
        assert_eq!(info.contract_amount, Some(BigDecimal::from(10_000_000)));
        assert_eq!(info.start_date.as_deref(), Some("2023-01-15"));
        assert_eq!(info.contractor.as_deref(), Some("Formosa Civil Works"));
        assert_eq!(info.extra["bid_round"], json!(2));
    }

    #[test]
    fn structured_payment_conditions_are_kept() {
        let n = normalizer();
        let outcome = n.normalize_document(
            &json!({
                "payment_conditions": [
                    {"condition_text": "驗收合格後支付尾款"},
                    "not an object",
                ],
            }),
            DocumentType::Estimation,
        );

        assert_eq!(outcome.document.payment_conditions.len(), 1);
        assert_eq!(
            outcome.document.payment_conditions[0].condition_text.as_deref(),
            Some("驗收合格後支付尾款")
        );
        assert!(outcome.warnings.iter().any(|w| w.contains("payment_conditions[1]")));
    }

    #[test]
    fn non_object_input_yields_empty_document_with_warning() {
        let n = normalizer();
        let outcome = n.normalize_document(&json!([1, 2, 3]), DocumentType::Other);
        assert!(outcome.document.items.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    // ── Null removal ────────────────────────────────────────────────

    #[test]
    fn remove_null_values_recursive() {
        let n = normalizer();
        let cleaned = n.remove_null_values(
            &json!({
                "a": 1,
                "b": null,
                "nested": {"c": null, "d": "kept"},
                "list": [null, {"e": null, "f": 2}],
            }),
            true,
        );

        assert_eq!(
            cleaned,
            json!({"a": 1, "nested": {"d": "kept"}, "list": [{"f": 2}]})
        );
    }

    #[test]
    fn remove_null_values_shallow_keeps_nested_nulls() {
        let n = normalizer();
        let cleaned = n.remove_null_values(
            &json!({"a": null, "nested": {"b": null}}),
            false,
        );
        assert_eq!(cleaned, json!({"nested": {"b": null}}));
    }
}
