use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde_json::Value;

use crate::config;
use crate::models::decimal;
use crate::models::{CheckResult, CheckSet, NormalizedDocument, OverallPolicy};

/// Verifies a document's internal arithmetic: the amount column summed
/// against the declared total, per-row quantity × unit price, and the
/// document's own period identity.
///
/// Pure and stateless; safe to share across concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct AmountEngine;

impl AmountEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run every amount check. Any `fail` or `error` fails the set — a
    /// coercion error gets no softer aggregate treatment here.
    pub fn validate_all(&self, document: &NormalizedDocument) -> CheckSet {
        let mut checks = BTreeMap::new();
        checks.insert(
            "vertical_sum".to_string(),
            self.validate_vertical_sum(document),
        );
        checks.insert(
            "horizontal_calculation".to_string(),
            self.validate_horizontal_calculation(document),
        );
        checks.insert(
            "period_consistency".to_string(),
            self.validate_period_consistency(document),
        );
        CheckSet::new(checks, OverallPolicy::Strict)
    }

    /// Column sum: Σ item.amount must match the declared total.
    pub fn validate_vertical_sum(&self, document: &NormalizedDocument) -> CheckResult {
        tracing::debug!("running vertical sum check");

        let declared = match declared_total(document) {
            Ok(declared) => declared,
            Err(raw) => {
                return CheckResult::error("declared total is not numeric")
                    .with_detail("raw_value", raw);
            }
        };

        let calculated = document.items.iter().fold(BigDecimal::zero(), |sum, item| {
            sum + item.amount.clone().unwrap_or_else(BigDecimal::zero)
        });

        let difference = (&calculated - &declared).abs();
        let result = if difference <= config::amount_tolerance() {
            CheckResult::pass("vertical sum check passed")
        } else {
            CheckResult::fail(format!("vertical sum mismatch: difference {difference}"))
        };

        result
            .with_detail("calculated", decimal::to_value(&calculated))
            .with_detail("declared", decimal::to_value(&declared))
            .with_detail("difference", decimal::to_value(&difference))
    }

    /// Row arithmetic: every item must satisfy quantity × unit_price ≈ amount.
    ///
    /// Failing rows are enumerated individually with computed vs. declared
    /// values and the delta — never just counted.
    pub fn validate_horizontal_calculation(&self, document: &NormalizedDocument) -> CheckResult {
        tracing::debug!("running horizontal calculation check");

        let tolerance = config::amount_tolerance();
        let mut failed_items = Vec::new();

        for (index, item) in document.items.iter().enumerate() {
            let quantity = item.quantity.clone().unwrap_or_else(BigDecimal::zero);
            let unit_price = item.unit_price.clone().unwrap_or_else(BigDecimal::zero);
            let declared = item.amount.clone().unwrap_or_else(BigDecimal::zero);

            let calculated = &unit_price * &quantity;
            let difference = (&calculated - &declared).abs();
            if difference > tolerance {
                failed_items.push(serde_json::json!({
                    "item_index": index,
                    "item_description": item.description.clone().unwrap_or_default(),
                    "calculated": decimal::to_value(&calculated),
                    "declared": decimal::to_value(&declared),
                    "difference": decimal::to_value(&difference),
                }));
            }
        }

        if failed_items.is_empty() {
            CheckResult::pass("horizontal calculation check passed")
                .with_detail("checked_items", document.items.len())
        } else {
            CheckResult::fail(format!(
                "{} item(s) fail row arithmetic",
                failed_items.len()
            ))
            .with_detail("failed_items", Value::Array(failed_items))
        }
    }

    /// Intra-document identity: previous accumulation + period amount must
    /// match the declared current accumulation.
    pub fn validate_period_consistency(&self, document: &NormalizedDocument) -> CheckResult {
        tracing::debug!("running period consistency check");

        let previous = document
            .previous_accumulation
            .clone()
            .unwrap_or_else(BigDecimal::zero);
        let period = document.period_amount.clone().unwrap_or_else(BigDecimal::zero);
        let declared = document
            .current_accumulation
            .clone()
            .unwrap_or_else(BigDecimal::zero);

        let calculated = &previous + &period;
        let difference = (&calculated - &declared).abs();

        let result = if difference <= config::amount_tolerance() {
            CheckResult::pass("period totals are consistent")
        } else {
            CheckResult::fail(format!(
                "period totals inconsistent: difference {difference}"
            ))
        };

        result
            .with_detail("calculated", decimal::to_value(&calculated))
            .with_detail("declared", decimal::to_value(&declared))
            .with_detail("difference", decimal::to_value(&difference))
    }
}

/// The total the document claims for the current period.
///
/// A loose legacy `total_amount` field wins when upstream supplied one;
/// otherwise the typed `period_amount`. Both default to 0 when absent.
/// A non-numeric legacy value is a data-quality error, not a rule failure.
fn declared_total(document: &NormalizedDocument) -> Result<BigDecimal, Value> {
    if let Some(raw) = document.extra.get("total_amount") {
        return decimal::from_value(raw).ok_or_else(|| raw.clone());
    }
    Ok(document
        .period_amount
        .clone()
        .unwrap_or_else(BigDecimal::zero))
}
