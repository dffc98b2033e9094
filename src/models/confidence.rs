use serde::{Deserialize, Serialize};

use crate::config;

/// Per-stage confidence signals combined into one overall figure.
///
/// Derived anew on every run from that run's inputs only; never carried
/// across runs. All values live in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub overall: f64,
    pub icr_accuracy: f64,
    pub field_mapping: f64,
    pub logic_understanding: f64,
    pub validation_confidence: f64,
}

/// Caller-overridable weights for the overall confidence score.
///
/// Overriding does not have to keep the weights summing to 1; the weighted
/// result is clamped to `[0, 1]` instead of rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub icr: f64,
    pub mapping: f64,
    pub validation: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            icr: config::DEFAULT_WEIGHT_ICR,
            mapping: config::DEFAULT_WEIGHT_MAPPING,
            validation: config::DEFAULT_WEIGHT_VALIDATION,
        }
    }
}
