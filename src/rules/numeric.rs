//! Numericality: integer and decimal format checks, and comparisons.
//!
//! Comparisons only apply to JSON numbers. A value that cannot be compared
//! with the expected number (a string, a boolean) passes the comparison; the
//! companion integer/decimal check is what rejects non-numeric input. This
//! fail-open behaviour awaits product sign-off.

use super::{Failure, Pattern, Rule};
use crate::builder::DeclarationError;
use crate::core::{as_number, display_value};
use crate::validation::ViolationType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static INTEGER: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"\A[+-]?\d+\z").expect("integer pattern is valid"));

/// Comparison applied between a value and an expected number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    pub fn holds(self, actual: f64, expected: f64) -> bool {
        match self {
            Self::Equal => actual == expected,
            Self::NotEqual => actual != expected,
            Self::GreaterThan => actual > expected,
            Self::GreaterThanOrEqual => actual >= expected,
            Self::LessThan => actual < expected,
            Self::LessThanOrEqual => actual <= expected,
        }
    }

    pub fn violation_type(self) -> ViolationType {
        match self {
            Self::Equal => ViolationType::EqualTo,
            Self::NotEqual => ViolationType::NotEqualTo,
            Self::GreaterThan => ViolationType::GreaterThan,
            Self::GreaterThanOrEqual => ViolationType::GreaterThanOrEqualTo,
            Self::LessThan => ViolationType::LessThan,
            Self::LessThanOrEqual => ViolationType::LessThanOrEqualTo,
        }
    }
}

/// One numericality check.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericCheck {
    /// String form must be an optionally signed run of digits.
    Integer,
    /// String form must be a decimal number fitting `precision`/`scale`.
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
        pattern: Pattern,
    },
    Compare {
        comparison: Comparison,
        expected: Value,
    },
}

impl NumericCheck {
    /// Decimal check for the given precision and scale.
    ///
    /// Fails when the combination cannot describe a number, e.g. a scale
    /// larger than the precision.
    pub fn decimal(precision: Option<u32>, scale: Option<u32>) -> Result<Self, DeclarationError> {
        let source = decimal_pattern(precision, scale)
            .ok_or(DeclarationError::InvalidPrecision { precision, scale })?;
        let pattern = Pattern::new(&source).map_err(|e| DeclarationError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self::Decimal {
            precision,
            scale,
            pattern,
        })
    }

    /// Comparison against an expected number.
    pub fn compare(
        comparison: Comparison,
        expected: impl Into<Value>,
    ) -> Result<Self, DeclarationError> {
        let expected = expected.into();
        if as_number(&expected).is_none() {
            return Err(DeclarationError::NonNumericBound(expected));
        }
        Ok(Self::Compare {
            comparison,
            expected,
        })
    }

    pub(super) fn check(&self, rule: &Rule, value: Option<&Value>) -> Option<Failure> {
        if rule.is_optional(value) {
            return None;
        }

        match self {
            Self::Integer => {
                let text = value.map(display_value).unwrap_or_default();
                (!INTEGER.is_match(&text)).then(|| Failure::new(ViolationType::NotAnInteger))
            }
            Self::Decimal { pattern, .. } => {
                let text = value.map(display_value).unwrap_or_default();
                (!pattern.is_match(&text)).then(|| Failure::new(ViolationType::NotANumber))
            }
            Self::Compare {
                comparison,
                expected,
            } => {
                let actual = value.and_then(as_number)?;
                let bound = as_number(expected)?;
                (!comparison.holds(actual, bound)).then(|| {
                    Failure::with_data(comparison.violation_type(), vec![expected.clone()])
                })
            }
        }
    }
}

/// Pattern source for a decimal with the given precision and scale.
///
/// Precision counts all digits, scale the digits after the point. Without
/// both, any plain decimal is accepted. Returns `None` for impossible
/// combinations.
///
/// # Example
///
/// ```rust
/// use validity::rules::decimal_pattern;
///
/// assert_eq!(
///     decimal_pattern(Some(5), Some(2)).as_deref(),
///     Some(r"\A[+-]?(?:\d{1,3}|\d{0,3}\.\d{1,2})\z")
/// );
/// assert_eq!(decimal_pattern(Some(2), Some(3)), None);
/// ```
pub fn decimal_pattern(precision: Option<u32>, scale: Option<u32>) -> Option<String> {
    match (precision, scale) {
        (Some(precision), Some(0)) if precision > 0 => {
            Some(format!(r"\A[+-]?(?:\d{{1,{precision}}}(?:\.0)?)\z"))
        }
        (Some(precision), Some(scale)) if precision > scale => {
            let delta = precision - scale;
            Some(format!(
                r"\A[+-]?(?:\d{{1,{delta}}}|\d{{0,{delta}}}\.\d{{1,{scale}}})\z"
            ))
        }
        (Some(precision), Some(scale)) if precision == scale && scale > 0 => {
            Some(format!(r"\A[+-]?(?:0(?:\.\d{{1,{scale}}})?)\z"))
        }
        (Some(_), Some(_)) => None,
        _ => Some(r"\A[+-]?(?:\d+|\d*\.\d+)\z".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;
    use serde_json::json;

    fn run(check: NumericCheck, value: Value) -> Option<Failure> {
        let rule = Rule::new("amount", RuleKind::Numeric(check.clone()));
        check.check(&rule, Some(&value))
    }

    #[test]
    fn integer_check_uses_string_form() {
        assert!(run(NumericCheck::Integer, json!(42)).is_none());
        assert!(run(NumericCheck::Integer, json!("-17")).is_none());
        assert!(run(NumericCheck::Integer, json!("+3")).is_none());

        let failure = run(NumericCheck::Integer, json!(4.5)).unwrap();
        assert_eq!(failure.violation_type, ViolationType::NotAnInteger);
        assert!(run(NumericCheck::Integer, json!("12abc")).is_some());
    }

    #[test]
    fn decimal_respects_precision_and_scale() {
        let check = NumericCheck::decimal(Some(5), Some(2)).unwrap();

        assert!(run(check.clone(), json!(123.45)).is_none());
        assert!(run(check.clone(), json!("123")).is_none());
        assert!(run(check.clone(), json!(".5")).is_none());
        assert!(run(check.clone(), json!("1234.5")).is_some());

        let failure = run(check, json!("12.345")).unwrap();
        assert_eq!(failure.violation_type, ViolationType::NotANumber);
    }

    #[test]
    fn zero_scale_allows_trailing_point_zero() {
        let check = NumericCheck::decimal(Some(3), Some(0)).unwrap();
        assert!(run(check.clone(), json!("999")).is_none());
        assert!(run(check.clone(), json!("12.0")).is_none());
        assert!(run(check, json!("1000")).is_some());
    }

    #[test]
    fn equal_precision_and_scale_is_fraction_only() {
        let check = NumericCheck::decimal(Some(2), Some(2)).unwrap();
        assert!(run(check.clone(), json!("0.25")).is_none());
        assert!(run(check, json!("1.25")).is_some());
    }

    #[test]
    fn impossible_precision_is_rejected() {
        let result = NumericCheck::decimal(Some(2), Some(4));
        assert!(matches!(
            result,
            Err(DeclarationError::InvalidPrecision {
                precision: Some(2),
                scale: Some(4)
            })
        ));
    }

    #[test]
    fn unconstrained_decimal_accepts_plain_numbers() {
        let check = NumericCheck::decimal(None, None).unwrap();
        assert!(run(check.clone(), json!(10)).is_none());
        assert!(run(check.clone(), json!("-0.75")).is_none());
        assert!(run(check, json!("ten")).is_some());
    }

    #[test]
    fn floats_in_exponent_range_are_plain_decimals() {
        let check = NumericCheck::decimal(None, None).unwrap();
        assert!(run(check.clone(), json!(1e-7)).is_none());
        assert!(run(check, json!(1e20)).is_none());

        let scaled = NumericCheck::decimal(Some(10), Some(8)).unwrap();
        assert!(run(scaled, json!(1e-7)).is_none());
        assert!(run(NumericCheck::Integer, json!(1e20)).is_some());
    }

    #[test]
    fn comparisons_report_expected_value() {
        let check = NumericCheck::compare(Comparison::GreaterThan, 10).unwrap();

        assert!(run(check.clone(), json!(11)).is_none());
        let failure = run(check, json!(10)).unwrap();
        assert_eq!(failure.violation_type, ViolationType::GreaterThan);
        assert_eq!(failure.data, vec![json!(10)]);
    }

    #[test]
    fn every_comparison_maps_to_its_type() {
        let cases = [
            (Comparison::Equal, json!(4), ViolationType::EqualTo),
            (Comparison::NotEqual, json!(5), ViolationType::NotEqualTo),
            (Comparison::GreaterThanOrEqual, json!(4), ViolationType::GreaterThanOrEqualTo),
            (Comparison::LessThan, json!(5), ViolationType::LessThan),
            (Comparison::LessThanOrEqual, json!(6), ViolationType::LessThanOrEqualTo),
        ];

        for (comparison, value, expected_type) in cases {
            let check = NumericCheck::compare(comparison, 5).unwrap();
            let failure = run(check, value).unwrap();
            assert_eq!(failure.violation_type, expected_type);
        }
    }

    #[test]
    fn incomparable_values_fail_open() {
        let check = NumericCheck::compare(Comparison::LessThan, 5).unwrap();
        assert!(run(check.clone(), json!("100")).is_none());
        assert!(run(check, json!(true)).is_none());
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let result = NumericCheck::compare(Comparison::Equal, "five");
        assert!(matches!(result, Err(DeclarationError::NonNumericBound(_))));
    }

    #[test]
    fn nil_fails_format_checks_unless_optional() {
        let strict = Rule::new("amount", RuleKind::Numeric(NumericCheck::Integer));
        assert!(NumericCheck::Integer.check(&strict, None).is_some());

        let lenient = strict.allow_nil(true);
        assert!(NumericCheck::Integer.check(&lenient, None).is_none());
    }
}
