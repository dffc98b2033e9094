use serde::{Deserialize, Serialize};

use super::enums::TriggerType;

/// One payment trigger parsed out of contract text.
///
/// Immutable once parsed. Evaluation against actual project progress happens
/// at a later point in time, outside document ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedPaymentCondition {
    pub original_text: String,
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_phase: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

impl ParsedPaymentCondition {
    /// An unrecognized condition: all trigger fields empty.
    pub fn unknown(text: &str) -> Self {
        Self {
            original_text: text.to_string(),
            trigger_type: TriggerType::Unknown,
            threshold: None,
            payment_phase: None,
            payment_percentage: None,
            conditions: Vec::new(),
        }
    }

    /// Whether the parser recognized a concrete trigger.
    pub fn is_recognized(&self) -> bool {
        self.trigger_type != TriggerType::Unknown
    }
}
