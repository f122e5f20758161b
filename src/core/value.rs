//! Helpers over the attribute value model.
//!
//! Attribute values are plain `serde_json::Value`s. An absent attribute and
//! `Value::Null` are both treated as nil.

use serde_json::Value;

/// Check if a value is nil (absent or JSON null).
pub fn is_nil(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Check if a value is blank.
///
/// Blank values are nil, `false`, whitespace-only strings, and empty
/// arrays or objects. Numbers are never blank.
///
/// # Example
///
/// ```rust
/// use validity::core::is_blank;
/// use serde_json::json;
///
/// assert!(is_blank(None));
/// assert!(is_blank(Some(&json!("   "))));
/// assert!(is_blank(Some(&json!([]))));
/// assert!(!is_blank(Some(&json!(0))));
/// assert!(!is_blank(Some(&json!("Sam"))));
/// ```
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(_)) => false,
    }
}

/// String form of a value, used for length measurement, pattern matching,
/// and message interpolation.
///
/// Strings render without quotes and nil renders as the empty string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => positional(f),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

// Floats in plain positional notation (`0.0000001`, not `1e-7`). Whole
// floats keep a `.0` so they stay distinguishable from integers.
fn positional(f: f64) -> String {
    let text = f.to_string();
    if f.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Numeric view of a value. Only JSON numbers are numeric; numeric-looking
/// strings are not coerced.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as the same value.
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}
