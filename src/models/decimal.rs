//! Decimal plumbing for money fields.
//!
//! Amounts are exact `BigDecimal`s in memory but plain JSON numbers on the
//! wire. Conversion goes through the number's rendered string form so the
//! decimal keeps the digits the document actually showed instead of the
//! binary expansion of an f64.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::{Number, Value};

/// Parse a JSON number into a `BigDecimal` with a stable string representation.
pub fn from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

/// Coerce a loose JSON value into a decimal.
///
/// Numbers convert through their rendered form, plain numeric strings parse
/// directly; anything else is `None` (the caller decides whether that is a
/// warning or a data-quality error).
pub fn from_value(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => from_number(n),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Convert an f64 through its shortest decimal rendering.
pub fn from_f64(v: f64) -> BigDecimal {
    BigDecimal::from_str(&format!("{v}")).unwrap_or_default()
}

/// Render a decimal as a JSON number for result payloads.
///
/// Lossy beyond f64 range, which is far outside any contract amount.
pub fn to_value(decimal: &BigDecimal) -> Value {
    decimal
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Serde bridge for `Option<BigDecimal>` fields that must read and write
/// as plain JSON numbers.
pub mod opt_amount {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<BigDecimal>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match value.as_ref().and_then(ToPrimitive::to_f64) {
            Some(f) => ser.serialize_f64(f),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<BigDecimal>, D::Error> {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw.as_ref().and_then(from_value))
    }
}
