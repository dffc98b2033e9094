use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{CheckResult, NormalizedDocument};

/// A single pluggable validation rule.
///
/// Rules are independent of one another: no rule may depend on another
/// rule's outcome, and priority affects report order only, never results.
pub trait Rule {
    /// Stable identifier the registry keys on.
    fn rule_id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether the rule participates in execution.
    fn enabled(&self) -> bool {
        true
    }

    /// Report ordering key; lower reports first.
    fn priority(&self) -> i32 {
        0
    }

    fn evaluate(&self, document: &NormalizedDocument) -> CheckResult;
}

/// One recorded rule execution.
#[derive(Debug, Clone)]
pub struct RuleExecution {
    pub rule_id: String,
    pub rule_name: String,
    pub result: CheckResult,
    pub executed_at: DateTime<Utc>,
}

/// Registry of validation rules keyed by rule id.
///
/// Registration replaces any rule with the same id. Execution runs every
/// enabled rule and appends to the execution history.
#[derive(Default)]
pub struct RulesEngine {
    rules: BTreeMap<String, Box<dyn Rule + Send + Sync>>,
    history: Vec<RuleExecution>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_rule(&mut self, rule: Box<dyn Rule + Send + Sync>) {
        tracing::info!(rule_id = rule.rule_id(), name = rule.name(), "registered rule");
        self.rules.insert(rule.rule_id().to_string(), rule);
    }

    pub fn unregister_rule(&mut self, rule_id: &str) {
        if self.rules.remove(rule_id).is_some() {
            tracing::info!(rule_id, "unregistered rule");
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every enabled rule against the document.
    ///
    /// Results come back in priority order.
    pub fn execute_rules(&mut self, document: &NormalizedDocument) -> Vec<(String, CheckResult)> {
        tracing::info!(total = self.rules.len(), "executing rules");

        let mut ordered: Vec<&(dyn Rule + Send + Sync)> = self
            .rules
            .values()
            .filter(|rule| rule.enabled())
            .map(|rule| rule.as_ref())
            .collect();
        ordered.sort_by_key(|rule| rule.priority());

        let mut results = Vec::with_capacity(ordered.len());
        for rule in ordered {
            let result = rule.evaluate(document);
            self.history.push(RuleExecution {
                rule_id: rule.rule_id().to_string(),
                rule_name: rule.name().to_string(),
                result: result.clone(),
                executed_at: Utc::now(),
            });
            results.push((rule.rule_id().to_string(), result));
        }
        results
    }

    /// Append-only record of every rule execution.
    pub fn history(&self) -> &[RuleExecution] {
        &self.history
    }
}
