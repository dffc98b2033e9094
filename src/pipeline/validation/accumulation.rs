use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde_json::Value;

use crate::config;
use crate::models::decimal;
use crate::models::{CheckResult, CheckSet, NormalizedDocument, OverallPolicy};

/// Verifies cross-period cumulative totals against the contract ceiling.
///
/// Warnings are non-blocking in this category: a missing contract is a gap
/// in the inputs, not an arithmetic violation. Contract terms arrive as a
/// loose mapping because older callers still carry them untyped.
#[derive(Debug, Clone, Default)]
pub struct AccumulationChecker;

impl AccumulationChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_all(
        &self,
        current_period: &NormalizedDocument,
        previous_periods: Option<&[NormalizedDocument]>,
        contract_info: Option<&Value>,
    ) -> CheckSet {
        let mut checks = BTreeMap::new();
        checks.insert(
            "accumulation_logic".to_string(),
            self.check_accumulation_logic(current_period, previous_periods),
        );
        checks.insert(
            "contract_limit".to_string(),
            self.check_contract_limit(current_period, contract_info),
        );
        checks.insert(
            "progress_check".to_string(),
            self.check_progress_reasonability(),
        );
        CheckSet::new(checks, OverallPolicy::LenientWarnings)
    }

    /// Prior cumulative total + current period amount must equal the
    /// declared current accumulation. The first period passes trivially.
    pub fn check_accumulation_logic(
        &self,
        current: &NormalizedDocument,
        previous: Option<&[NormalizedDocument]>,
    ) -> CheckResult {
        tracing::debug!("checking accumulation logic");

        let Some(latest_prior) = previous.and_then(<[NormalizedDocument]>::last) else {
            return CheckResult::pass("first period, no prior accumulation")
                .with_detail("period_number", current.period_number.unwrap_or(1));
        };

        let previous_total = latest_prior
            .current_accumulation
            .clone()
            .unwrap_or_else(BigDecimal::zero);
        let current_amount = current
            .period_amount
            .clone()
            .unwrap_or_else(BigDecimal::zero);
        let declared_total = current
            .current_accumulation
            .clone()
            .unwrap_or_else(BigDecimal::zero);

        let calculated_total = &previous_total + &current_amount;
        let difference = (&calculated_total - &declared_total).abs();

        let result = if difference <= config::amount_tolerance() {
            CheckResult::pass("accumulation logic check passed")
        } else {
            CheckResult::fail(format!("accumulation mismatch: difference {difference}"))
        };

        result
            .with_detail("previous_total", decimal::to_value(&previous_total))
            .with_detail("current_amount", decimal::to_value(&current_amount))
            .with_detail("calculated_total", decimal::to_value(&calculated_total))
            .with_detail("declared_total", decimal::to_value(&declared_total))
            .with_detail("difference", decimal::to_value(&difference))
    }

    /// Declared accumulation must stay under the contract ceiling.
    ///
    /// The ceiling resolves from the newer `current_total_amount` field
    /// first, then the legacy `contract_amount`. Without contract info the
    /// check degrades to a warning: nothing to compare against.
    pub fn check_contract_limit(
        &self,
        current: &NormalizedDocument,
        contract_info: Option<&Value>,
    ) -> CheckResult {
        tracing::debug!("checking contract limit");

        let info = match contract_info
            .and_then(Value::as_object)
            .filter(|object| !object.is_empty())
        {
            Some(info) => info,
            None => {
                return CheckResult::warning(
                    "no contract info available; cannot check the ceiling",
                )
            }
        };

        let ceiling_raw = info
            .get("current_total_amount")
            .filter(|value| !value.is_null())
            .or_else(|| info.get("contract_amount"));

        let ceiling = match ceiling_raw {
            None => BigDecimal::zero(),
            Some(raw) => match decimal::from_value(raw) {
                Some(ceiling) => ceiling,
                None => {
                    return CheckResult::error("contract ceiling is not numeric")
                        .with_detail("raw_value", raw.clone());
                }
            },
        };

        let current_total = current
            .current_accumulation
            .clone()
            .unwrap_or_else(BigDecimal::zero);

        if current_total > ceiling {
            let exceeded = &current_total - &ceiling;
            CheckResult::fail("accumulated amount exceeds the contract ceiling")
                .with_detail("contract_amount", decimal::to_value(&ceiling))
                .with_detail("current_total", decimal::to_value(&current_total))
                .with_detail("exceeded_amount", decimal::to_value(&exceeded))
        } else {
            let remaining = &ceiling - &current_total;
            // A zero ceiling would divide by zero; usage is defined as 0 there.
            let usage_percentage = if ceiling > BigDecimal::zero() {
                (&current_total * BigDecimal::from(100) / &ceiling)
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            CheckResult::pass("within the contract ceiling")
                .with_detail("contract_amount", decimal::to_value(&ceiling))
                .with_detail("current_total", decimal::to_value(&current_total))
                .with_detail("remaining_amount", decimal::to_value(&remaining))
                .with_detail("usage_percentage", usage_percentage)
        }
    }

    /// Progress reasonability is not implemented: what counts as "too fast"
    /// or "too slow" needs real business thresholds. Reports an
    /// unconditional pass until those exist.
    pub fn check_progress_reasonability(&self) -> CheckResult {
        CheckResult::pass("progress reasonability check not yet implemented")
    }
}
