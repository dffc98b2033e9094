use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::models::{CheckResult, NormalizedDocument, ParsedPaymentCondition, TriggerType};
use crate::pipeline::understanding::LanguageService;

/// Progress trigger: a completion percentage tied to a payment phase whose
/// ordinal may be written as a Chinese numeral ("工程完成30%後支付第二期款").
static PROGRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"工程完成.*?(\d+(?:\.\d+)?)%.*?(?:第([一二三四五六七八九十]+)期|第(\d+)期)")
        .unwrap()
});

/// Duration trigger, in months ("完工後3個月").
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)個?月").unwrap());

/// Chinese ordinal numerals one through ten.
///
/// Unmapped numerals deliberately collapse to 0 rather than erroring — the
/// condition still parses, only the phase number is lost.
fn chinese_numeral(text: &str) -> u32 {
    match text {
        "一" => 1,
        "二" => 2,
        "三" => 3,
        "四" => 4,
        "五" => 5,
        "六" => 6,
        "七" => 7,
        "八" => 8,
        "九" => 9,
        "十" => 10,
        _ => 0,
    }
}

/// Parses natural-language payment triggers and evaluates them against
/// actual project state.
///
/// Two interchangeable parsing strategies produce the same output shape:
/// the external language service, or the deterministic patterns below —
/// downstream evaluation never knows which one ran.
#[derive(Default)]
pub struct PaymentConditionEngine {
    language: Option<Arc<dyn LanguageService + Send + Sync>>,
}

impl PaymentConditionEngine {
    /// Engine with the deterministic rule parser only.
    pub fn new() -> Self {
        Self { language: None }
    }

    /// Engine that prefers the language service for parsing.
    pub fn with_language_service(language: Arc<dyn LanguageService + Send + Sync>) -> Self {
        Self {
            language: Some(language),
        }
    }

    /// Parse one condition sentence.
    ///
    /// With `use_llm`, the language service is asked first; if it errors,
    /// the rule parser takes over so parsing never hard-fails.
    pub fn parse_condition(&self, condition_text: &str, use_llm: bool) -> ParsedPaymentCondition {
        tracing::debug!(text = %condition_text, use_llm, "parsing payment condition");

        if use_llm {
            if let Some(language) = &self.language {
                match language.parse_condition_text(condition_text) {
                    Ok(parsed) => return parsed,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "language service parse failed, falling back to rule parser"
                        );
                    }
                }
            }
        }

        self.parse_with_rules(condition_text)
    }

    /// Deterministic pattern-based parsing.
    ///
    /// Later patterns overwrite the trigger of earlier ones when a sentence
    /// matches several; unmatched text comes back as `unknown`, never as an
    /// error.
    pub fn parse_with_rules(&self, condition_text: &str) -> ParsedPaymentCondition {
        let mut parsed = ParsedPaymentCondition::unknown(condition_text);

        // Progress percentage tied to a payment phase
        if let Some(captures) = PROGRESS_PATTERN.captures(condition_text) {
            parsed.trigger_type = TriggerType::Progress;
            parsed.threshold = captures.get(1).and_then(|m| m.as_str().parse().ok());
            parsed.payment_phase = match captures.get(2) {
                Some(numeral) => Some(chinese_numeral(numeral.as_str())),
                None => captures.get(3).and_then(|m| m.as_str().parse().ok()),
            };
        }

        // Acceptance keyword
        if condition_text.contains("驗收") {
            parsed.trigger_type = TriggerType::Acceptance;
            if condition_text.contains("合格") {
                parsed.conditions.push("acceptance_passed".to_string());
            }
        }

        // Duration in months
        if let Some(captures) = DURATION_PATTERN.captures(condition_text) {
            parsed.trigger_type = TriggerType::Time;
            parsed.threshold = captures.get(1).and_then(|m| m.as_str().parse().ok());
        }

        parsed
    }

    /// Evaluate a parsed condition against actual project state.
    ///
    /// Only progress triggers have defined semantics today; acceptance,
    /// time and milestone evaluation are explicit no-ops until their
    /// threshold semantics are specified.
    pub fn validate_payment(
        &self,
        condition: &ParsedPaymentCondition,
        actual_state: &Value,
    ) -> CheckResult {
        tracing::debug!(
            trigger = condition.trigger_type.as_str(),
            "validating payment condition"
        );

        match condition.trigger_type {
            TriggerType::Progress => self.validate_progress_condition(condition, actual_state),
            TriggerType::Acceptance => {
                CheckResult::pass("acceptance condition evaluation not yet implemented")
            }
            TriggerType::Time => CheckResult::pass("time condition evaluation not yet implemented"),
            TriggerType::Milestone => {
                CheckResult::pass("milestone condition evaluation not yet implemented")
            }
            TriggerType::Unknown => CheckResult::warning("unrecognized payment condition type"),
        }
    }

    fn validate_progress_condition(
        &self,
        condition: &ParsedPaymentCondition,
        actual_state: &Value,
    ) -> CheckResult {
        let required = condition.threshold.unwrap_or(0.0);
        let actual = actual_state
            .get("progress_percentage")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let result = if actual >= required {
            CheckResult::pass(format!(
                "actual progress {actual}% meets the required {required}%"
            ))
        } else {
            CheckResult::fail(format!(
                "actual progress {actual}% is below the required {required}%"
            ))
        };

        result
            .with_detail("required_progress", required)
            .with_detail("actual_progress", actual)
    }

    /// Pull every payment condition off a document.
    ///
    /// Free-text terms are parsed; conditions the document already carries
    /// in structured form bypass re-parsing and are taken verbatim.
    pub fn extract_conditions_from_document(
        &self,
        document: &NormalizedDocument,
    ) -> Vec<ParsedPaymentCondition> {
        tracing::debug!("extracting payment conditions from document");

        let mut conditions = Vec::new();

        if let Some(terms) = payment_terms(document) {
            if !terms.is_empty() {
                conditions.push(self.parse_condition(&terms, self.language.is_some()));
            }
        }

        for entry in &document.payment_conditions {
            if let Some(parsed) = &entry.parsed_condition {
                conditions.push(parsed.clone());
            } else if let Some(text) = &entry.condition_text {
                conditions.push(self.parse_condition(text, self.language.is_some()));
            }
        }

        conditions
    }
}

/// Payment terms, supporting both document layouts: the newer
/// `contract_financials` mapping is authoritative when present, the typed
/// (legacy) contract info otherwise.
fn payment_terms(document: &NormalizedDocument) -> Option<String> {
    if let Some(financials) = document
        .extra
        .get("contract_financials")
        .and_then(Value::as_object)
    {
        return financials
            .get("payment_terms")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    document
        .contract_info
        .as_ref()
        .and_then(|info| info.payment_terms.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{CheckStatus, ContractInfo, DocumentType, PaymentConditionEntry};
    use crate::pipeline::extraction::RawExtraction;
    use crate::pipeline::standardize::Schema;
    use crate::pipeline::understanding::{LanguageService, UnderstandingError};

    /// Language service that always errors, to exercise the fallback.
    struct UnavailableLanguageService;

    impl LanguageService for UnavailableLanguageService {
        fn map_fields(
            &self,
            _extraction: &RawExtraction,
            _target_schema: &Schema,
        ) -> Result<Value, UnderstandingError> {
            Err(UnderstandingError::Connection("http://nlp.internal".into()))
        }

        fn parse_condition_text(
            &self,
            _text: &str,
        ) -> Result<ParsedPaymentCondition, UnderstandingError> {
            Err(UnderstandingError::Connection("http://nlp.internal".into()))
        }
    }

    /// Language service with one canned parse result.
    struct CannedLanguageService {
        condition: ParsedPaymentCondition,
    }

    impl LanguageService for CannedLanguageService {
        fn map_fields(
            &self,
            _extraction: &RawExtraction,
            _target_schema: &Schema,
        ) -> Result<Value, UnderstandingError> {
            Ok(json!({}))
        }

        fn parse_condition_text(
            &self,
            _text: &str,
        ) -> Result<ParsedPaymentCondition, UnderstandingError> {
            Ok(self.condition.clone())
        }
    }

    // ── Rule-based parsing ──────────────────────────────────────────

    #[test]
    fn progress_condition_with_chinese_ordinal_parses() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("工程完成30%後支付第二期款");

        assert_eq!(parsed.trigger_type, TriggerType::Progress);
        assert_eq!(parsed.threshold, Some(30.0));
        assert_eq!(parsed.payment_phase, Some(2));
    }

    #[test]
    fn progress_condition_with_digit_phase_parses() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("工程完成75.5%後支付第3期款");

        assert_eq!(parsed.trigger_type, TriggerType::Progress);
        assert_eq!(parsed.threshold, Some(75.5));
        assert_eq!(parsed.payment_phase, Some(3));
    }

    #[test]
    fn unmapped_ordinal_defaults_the_phase_to_zero() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("工程完成50%後支付第十一期款");

        assert_eq!(parsed.trigger_type, TriggerType::Progress);
        assert_eq!(parsed.payment_phase, Some(0));
    }

    #[test]
    fn acceptance_condition_parses_with_passed_flag() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("驗收合格後支付尾款");

        assert_eq!(parsed.trigger_type, TriggerType::Acceptance);
        assert_eq!(parsed.conditions, vec!["acceptance_passed".to_string()]);
    }

    #[test]
    fn duration_condition_parses_months() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("完工後3個月內支付保留款");

        assert_eq!(parsed.trigger_type, TriggerType::Time);
        assert_eq!(parsed.threshold, Some(3.0));
    }

    #[test]
    fn unrelated_text_is_unknown_not_an_error() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("monthly invoices due on receipt");

        assert_eq!(parsed.trigger_type, TriggerType::Unknown);
        assert!(parsed.threshold.is_none());
        assert!(parsed.payment_phase.is_none());
    }

    // ── Strategy selection ──────────────────────────────────────────

    #[test]
    fn language_service_result_is_preferred_when_available() {
        let canned = ParsedPaymentCondition {
            original_text: "after handover".into(),
            trigger_type: TriggerType::Milestone,
            threshold: None,
            payment_phase: Some(4),
            payment_percentage: Some(10.0),
            conditions: vec!["handover_complete".into()],
        };
        let engine = PaymentConditionEngine::with_language_service(Arc::new(
            CannedLanguageService { condition: canned },
        ));

        let parsed = engine.parse_condition("after handover", true);
        assert_eq!(parsed.trigger_type, TriggerType::Milestone);
        assert_eq!(parsed.payment_phase, Some(4));
    }

    #[test]
    fn service_failure_falls_back_to_the_rule_parser() {
        let engine =
            PaymentConditionEngine::with_language_service(Arc::new(UnavailableLanguageService));

        let parsed = engine.parse_condition("工程完成30%後支付第二期款", true);
        assert_eq!(parsed.trigger_type, TriggerType::Progress);
        assert_eq!(parsed.threshold, Some(30.0));
    }

    #[test]
    fn use_llm_false_skips_the_service() {
        let engine = PaymentConditionEngine::with_language_service(Arc::new(
            CannedLanguageService {
                condition: ParsedPaymentCondition::unknown("canned"),
            },
        ));
        let parsed = engine.parse_condition("驗收合格後支付尾款", false);
        assert_eq!(parsed.trigger_type, TriggerType::Acceptance);
    }

    // ── Evaluation ──────────────────────────────────────────────────

    #[test]
    fn progress_trigger_passes_when_actual_meets_threshold() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("工程完成30%後支付第二期款");

        let result = engine.validate_payment(&parsed, &json!({"progress_percentage": 45.0}));
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.details["actual_progress"], json!(45.0));
    }

    #[test]
    fn progress_trigger_fails_below_threshold() {
        let engine = PaymentConditionEngine::new();
        let parsed = engine.parse_with_rules("工程完成30%後支付第二期款");

        let result = engine.validate_payment(&parsed, &json!({"progress_percentage": 20.0}));
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn unimplemented_triggers_pass_with_an_explicit_message() {
        let engine = PaymentConditionEngine::new();
        for text in ["驗收合格後支付尾款", "完工後3個月內支付保留款"] {
            let parsed = engine.parse_with_rules(text);
            let result = engine.validate_payment(&parsed, &json!({}));
            assert_eq!(result.status, CheckStatus::Pass);
            assert!(result.message.contains("not yet implemented"));
        }
    }

    #[test]
    fn unknown_trigger_evaluates_to_a_warning() {
        let engine = PaymentConditionEngine::new();
        let parsed = ParsedPaymentCondition::unknown("free text");
        let result = engine.validate_payment(&parsed, &json!({}));
        assert_eq!(result.status, CheckStatus::Warning);
    }

    // ── Extraction from documents ───────────────────────────────────

    #[test]
    fn terms_come_from_typed_contract_info() {
        let engine = PaymentConditionEngine::new();
        let mut doc = NormalizedDocument::new(DocumentType::Estimation);
        doc.contract_info = Some(ContractInfo {
            payment_terms: Some("工程完成30%後支付第二期款".into()),
            ..ContractInfo::default()
        });

        let conditions = engine.extract_conditions_from_document(&doc);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].trigger_type, TriggerType::Progress);
    }

    #[test]
    fn newer_contract_financials_layout_is_authoritative() {
        let engine = PaymentConditionEngine::new();
        let mut doc = NormalizedDocument::new(DocumentType::Estimation);
        doc.contract_info = Some(ContractInfo {
            payment_terms: Some("驗收合格後支付尾款".into()),
            ..ContractInfo::default()
        });
        doc.extra.insert(
            "contract_financials".into(),
            json!({"payment_terms": "工程完成30%後支付第二期款"}),
        );

        let conditions = engine.extract_conditions_from_document(&doc);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].trigger_type, TriggerType::Progress);
    }

    #[test]
    fn pre_parsed_conditions_bypass_reparsing() {
        let engine = PaymentConditionEngine::new();
        let already_parsed = ParsedPaymentCondition {
            original_text: "milestone: structure topped out".into(),
            trigger_type: TriggerType::Milestone,
            threshold: None,
            payment_phase: Some(2),
            payment_percentage: None,
            conditions: vec![],
        };

        let mut doc = NormalizedDocument::new(DocumentType::Estimation);
        doc.payment_conditions = vec![
            PaymentConditionEntry {
                parsed_condition: Some(already_parsed.clone()),
                ..PaymentConditionEntry::default()
            },
            PaymentConditionEntry {
                condition_text: Some("驗收合格後支付尾款".into()),
                ..PaymentConditionEntry::default()
            },
        ];

        let conditions = engine.extract_conditions_from_document(&doc);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].trigger_type, TriggerType::Milestone);
        assert_eq!(conditions[0].payment_phase, Some(2));
        assert_eq!(conditions[1].trigger_type, TriggerType::Acceptance);
    }

    #[test]
    fn empty_terms_produce_no_conditions() {
        let engine = PaymentConditionEngine::new();
        let doc = NormalizedDocument::new(DocumentType::Estimation);
        assert!(engine.extract_conditions_from_document(&doc).is_empty());
    }
}
