use serde_json::Value;

use crate::config;
use crate::models::{
    CheckStatus, ConfidenceWeights, ParsedPaymentCondition, ValidationResult,
};
use crate::pipeline::extraction::RawExtraction;

/// Combines per-stage confidence signals into one overall score.
///
/// Every figure is recomputed from the current run's inputs; nothing is
/// carried over between runs.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceCalculator;

impl ConfidenceCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Mean of the per-page recognition confidences.
    ///
    /// When the extraction service reports none, a fixed optimistic
    /// fallback applies rather than zero — absent metadata is not evidence
    /// of bad recognition.
    pub fn icr_confidence(&self, extraction: &RawExtraction) -> f64 {
        let confidences: Vec<f64> = extraction
            .pages
            .iter()
            .filter_map(|page| page.confidence)
            .collect();

        if confidences.is_empty() {
            return config::DEFAULT_ICR_CONFIDENCE;
        }
        confidences.iter().sum::<f64>() / confidences.len() as f64
    }

    /// Required-field coverage (70%) blended with per-value quality (30%).
    ///
    /// With no required fields there is nothing to miss, so the result is
    /// full confidence.
    pub fn field_mapping_confidence(&self, mapped: &Value, required_fields: &[String]) -> f64 {
        let Some(object) = mapped.as_object() else {
            return 0.0;
        };
        if required_fields.is_empty() {
            return 1.0;
        }

        let found = required_fields
            .iter()
            .filter(|field| object.get(field.as_str()).is_some_and(value_is_present))
            .count();
        let coverage = found as f64 / required_fields.len() as f64;

        let quality_scores: Vec<f64> = object.values().map(value_quality).collect();
        let quality = if quality_scores.is_empty() {
            1.0
        } else {
            quality_scores.iter().sum::<f64>() / quality_scores.len() as f64
        };

        coverage * 0.7 + quality * 0.3
    }

    /// Fraction of individual checks that passed, flattened across every
    /// category. Zero checks is vacuously full confidence, not zero.
    pub fn validation_confidence(&self, validation: &ValidationResult) -> f64 {
        let mut pass_count = 0usize;
        let mut total = 0usize;

        for check in validation.all_checks() {
            total += 1;
            if check.status == CheckStatus::Pass {
                pass_count += 1;
            }
        }

        if total == 0 {
            return 1.0;
        }
        pass_count as f64 / total as f64
    }

    /// Fraction of payment conditions parsed to a concrete trigger type.
    pub fn logic_confidence(&self, conditions: &[ParsedPaymentCondition]) -> f64 {
        if conditions.is_empty() {
            return 1.0;
        }
        let recognized = conditions
            .iter()
            .filter(|condition| condition.is_recognized())
            .count();
        recognized as f64 / conditions.len() as f64
    }

    /// Weighted overall score, clamped to `[0, 1]`.
    ///
    /// Weights are taken as given — they are not required to sum to 1.
    pub fn overall_confidence(
        &self,
        icr: f64,
        mapping: f64,
        validation: f64,
        weights: &ConfidenceWeights,
    ) -> f64 {
        (icr * weights.icr + mapping * weights.mapping + validation * weights.validation)
            .clamp(0.0, 1.0)
    }
}

/// Whether a mapped value actually carries content.
fn value_is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(entries) => !entries.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Rough quality score of one mapped value.
fn value_quality(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::String(s) if s.is_empty() => 0.0,
        Value::String(s) if s.chars().count() < 2 => 0.5,
        _ => 1.0,
    }
}
