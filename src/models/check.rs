use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::condition::ParsedPaymentCondition;
use super::enums::CheckStatus;

/// Terminal outcome of one validation check.
///
/// `Fail` means the rule computed cleanly and did not hold; `Error` means the
/// inputs could not be coerced at all (a data-quality problem, not a
/// business-rule violation). The two are never folded together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl CheckResult {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Error, message)
    }

    /// Attach a structured detail value.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// How a category of checks rolls up into one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallPolicy {
    /// Only `Pass` counts as passing.
    Strict,
    /// `Warning` is non-blocking; `Fail` and `Error` still block.
    LenientWarnings,
}

/// Named check results for one validation category plus the rolled-up status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSet {
    pub checks: BTreeMap<String, CheckResult>,
    pub overall_status: CheckStatus,
}

impl CheckSet {
    pub fn new(checks: BTreeMap<String, CheckResult>, policy: OverallPolicy) -> Self {
        let all_passed = checks.values().all(|check| match policy {
            OverallPolicy::Strict => check.status == CheckStatus::Pass,
            OverallPolicy::LenientWarnings => {
                matches!(check.status, CheckStatus::Pass | CheckStatus::Warning)
            }
        });
        let overall_status = if all_passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        Self {
            checks,
            overall_status,
        }
    }

    pub fn passed(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }

    /// Individual results, in report order.
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.values()
    }
}

/// Aggregate validation outcome for one document run.
///
/// Payment conditions carry parse output only: evaluating them against
/// actual project state happens later, through a separate operation, so
/// they do not weigh on `overall_status` at ingest time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub amount: CheckSet,
    pub accumulation: CheckSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_conditions: Vec<ParsedPaymentCondition>,
    pub overall_status: CheckStatus,
}

impl ValidationResult {
    pub fn new(
        amount: CheckSet,
        accumulation: CheckSet,
        payment_conditions: Vec<ParsedPaymentCondition>,
    ) -> Self {
        let overall_status = if amount.passed() && accumulation.passed() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        Self {
            amount,
            accumulation,
            payment_conditions,
            overall_status,
        }
    }

    /// Every individual check, flattened across categories.
    pub fn all_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.amount.results().chain(self.accumulation.results())
    }
}
