pub mod check;
pub mod condition;
pub mod confidence;
pub mod decimal;
pub mod document;
pub mod enums;

pub use check::{CheckResult, CheckSet, OverallPolicy, ValidationResult};
pub use condition::ParsedPaymentCondition;
pub use confidence::{ConfidenceScore, ConfidenceWeights};
pub use document::{ContractInfo, LineItem, NormalizedDocument, PaymentConditionEntry};
pub use enums::{CheckStatus, DocumentStatus, DocumentType, TriggerType};
