pub mod accumulation;
pub mod amount;
pub mod payment;
pub mod rules;

pub use accumulation::AccumulationChecker;
pub use amount::AmountEngine;
pub use payment::PaymentConditionEngine;
pub use rules::{Rule, RuleExecution, RulesEngine};
