use std::str::FromStr;

use bigdecimal::BigDecimal;

/// Application-level constants
pub const APP_NAME: &str = "Tallyvet";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum absolute discrepancy tolerated by every amount check, in the
/// document's currency. Stored as a string literal so the decimal is exact.
pub const AMOUNT_TOLERANCE: &str = "0.01";

/// Fallback ICR confidence when the extraction service reports no
/// per-page confidence metadata.
pub const DEFAULT_ICR_CONFIDENCE: f64 = 0.8;

/// Default weight of the ICR confidence in the overall score.
pub const DEFAULT_WEIGHT_ICR: f64 = 0.3;

/// Default weight of the field-mapping confidence in the overall score.
pub const DEFAULT_WEIGHT_MAPPING: f64 = 0.4;

/// Default weight of the validation confidence in the overall score.
pub const DEFAULT_WEIGHT_VALIDATION: f64 = 0.3;

/// Default endpoint for the remote ICR extraction service.
pub const DEFAULT_EXTRACTION_ENDPOINT: &str = "http://localhost:8070";

/// Default endpoint for the remote language-understanding service.
pub const DEFAULT_UNDERSTANDING_ENDPOINT: &str = "http://localhost:8071";

/// Default HTTP timeout for external service calls, in seconds.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 120;

/// The amount tolerance as an exact decimal.
pub fn amount_tolerance() -> BigDecimal {
    BigDecimal::from_str(AMOUNT_TOLERANCE).expect("AMOUNT_TOLERANCE is a valid decimal literal")
}

/// Default `tracing` filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
