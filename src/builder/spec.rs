//! Declarative rule specifications.
//!
//! A [`RuleSpec`] describes a check independently of the attribute it is
//! declared on. Turning it into concrete [`Rule`]s resolves option aliases
//! and rejects malformed declarations.

use super::error::DeclarationError;
use super::options::RuleOptions;
use crate::core::{as_number, MethodOutcome, Subject};
use crate::rules::{
    predefined_format, BlockFn, Comparison, FormatFn, FormatMatcher, LengthBound, NumericCheck,
    Pattern, Rule, RuleKind, Within,
};
use crate::validation::ViolationType;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Length limits, before alias resolution.
///
/// # Example
///
/// ```rust
/// use validity::builder::LengthSpec;
/// use validity::rules::LengthBound;
///
/// let spec = LengthSpec::new().min(2).max(10);
/// assert_eq!(spec.resolve("name").unwrap(), LengthBound::Range { min: 2, max: 10 });
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LengthSpec {
    equal: Option<usize>,
    minimum: Option<usize>,
    maximum: Option<usize>,
    range: Option<(usize, Option<usize>)>,
}

impl LengthSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(mut self, length: usize) -> Self {
        self.equal = Some(length);
        self
    }

    pub fn equals(self, length: usize) -> Self {
        self.is(length)
    }

    /// Inclusive range. A `None` upper bound is rejected on resolution.
    pub fn within(mut self, min: usize, max: impl Into<Option<usize>>) -> Self {
        self.range = Some((min, max.into()));
        self
    }

    pub fn minimum(mut self, length: usize) -> Self {
        self.minimum = Some(length);
        self
    }

    pub fn min(self, length: usize) -> Self {
        self.minimum(length)
    }

    pub fn maximum(mut self, length: usize) -> Self {
        self.maximum = Some(length);
        self
    }

    pub fn max(self, length: usize) -> Self {
        self.maximum(length)
    }

    /// Read limits from a JSON options object.
    ///
    /// Recognised keys: `is`/`equals`, `within`/`in` (a `[min, max]` pair,
    /// `null` max meaning unbounded), `minimum`/`min`, `maximum`/`max`.
    pub fn from_options(options: &Value) -> Result<Self, DeclarationError> {
        let map = object(options)?;
        let range = match first(map, &["within", "in"]) {
            Some((key, value)) => Some(length_range(key, value)?),
            None => None,
        };

        Ok(Self {
            equal: length_option(map, &["is", "equals"])?,
            minimum: length_option(map, &["minimum", "min"])?,
            maximum: length_option(map, &["maximum", "max"])?,
            range,
        })
    }

    /// Collapse the declared limits into a single bound.
    pub fn resolve(&self, attribute: &str) -> Result<LengthBound, DeclarationError> {
        let bound = match (self.equal, self.range, self.minimum, self.maximum) {
            (Some(length), ..) => LengthBound::Equal(length),
            (None, Some((_, None)), ..) => {
                return Err(DeclarationError::InfiniteLengthRange {
                    attribute: attribute.to_string(),
                })
            }
            (None, Some((min, Some(max))), ..) | (None, None, Some(min), Some(max)) => {
                if min > max {
                    return Err(DeclarationError::InvalidRange {
                        min: Some(Value::from(min)),
                        max: Some(Value::from(max)),
                    });
                }
                LengthBound::Range { min, max }
            }
            (None, None, Some(min), None) => LengthBound::Minimum(min),
            (None, None, None, Some(max)) => LengthBound::Maximum(max),
            (None, None, None, None) => {
                warn!(attribute, "length rule declared without a bound");
                return Err(DeclarationError::UnboundLength {
                    attribute: attribute.to_string(),
                });
            }
        };
        Ok(bound)
    }
}

/// Numericality: a format check plus optional comparisons.
///
/// # Example
///
/// ```rust
/// use validity::builder::NumericSpec;
///
/// let spec = NumericSpec::new().only_integer().gte(0).lt(150);
/// assert_eq!(spec.checks().unwrap().len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumericSpec {
    integer_only: bool,
    precision: Option<u32>,
    scale: Option<u32>,
    bounds: Vec<(Comparison, Value)>,
}

const COMPARISON_KEYS: [(Comparison, &[&str]); 6] = [
    (Comparison::GreaterThan, &["gt", "greater_than"]),
    (Comparison::LessThan, &["lt", "less_than"]),
    (
        Comparison::GreaterThanOrEqual,
        &["gte", "greater_than_or_equal_to"],
    ),
    (Comparison::LessThanOrEqual, &["lte", "less_than_or_equal_to"]),
    (
        Comparison::Equal,
        &["eq", "equal", "equals", "exactly", "equal_to"],
    ),
    (Comparison::NotEqual, &["ne", "not_equal_to"]),
];

impl NumericSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_integer(mut self) -> Self {
        self.integer_only = true;
        self
    }

    pub fn integer_only(self) -> Self {
        self.only_integer()
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Add a comparison, replacing an earlier one of the same kind.
    pub fn compare(mut self, comparison: Comparison, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        match self.bounds.iter_mut().find(|(c, _)| *c == comparison) {
            Some(bound) => bound.1 = expected,
            None => self.bounds.push((comparison, expected)),
        }
        self
    }

    pub fn gt(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::GreaterThan, expected)
    }

    pub fn greater_than(self, expected: impl Into<Value>) -> Self {
        self.gt(expected)
    }

    pub fn gte(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::GreaterThanOrEqual, expected)
    }

    pub fn greater_than_or_equal_to(self, expected: impl Into<Value>) -> Self {
        self.gte(expected)
    }

    pub fn lt(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::LessThan, expected)
    }

    pub fn less_than(self, expected: impl Into<Value>) -> Self {
        self.lt(expected)
    }

    pub fn lte(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::LessThanOrEqual, expected)
    }

    pub fn less_than_or_equal_to(self, expected: impl Into<Value>) -> Self {
        self.lte(expected)
    }

    pub fn equal_to(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::Equal, expected)
    }

    pub fn exactly(self, expected: impl Into<Value>) -> Self {
        self.equal_to(expected)
    }

    pub fn not_equal_to(self, expected: impl Into<Value>) -> Self {
        self.compare(Comparison::NotEqual, expected)
    }

    /// Read a numericality declaration from a JSON options object, accepting
    /// every alias of each option.
    pub fn from_options(options: &Value) -> Result<Self, DeclarationError> {
        let map = object(options)?;
        let mut spec = Self::new();

        if let Some((key, value)) = first(map, &["only_integer", "integer_only"]) {
            spec.integer_only = value
                .as_bool()
                .ok_or_else(|| invalid_option(key, value))?;
        }
        if let Some((key, value)) = first(map, &["precision"]) {
            spec.precision = Some(u32_value(key, value)?);
        }
        if let Some((key, value)) = first(map, &["scale"]) {
            spec.scale = Some(u32_value(key, value)?);
        }
        for (comparison, keys) in COMPARISON_KEYS {
            if let Some((_, value)) = first(map, keys) {
                spec = spec.compare(comparison, value.clone());
            }
        }
        Ok(spec)
    }

    /// The format check followed by one comparison per declared bound.
    pub fn checks(&self) -> Result<Vec<NumericCheck>, DeclarationError> {
        let format = if self.integer_only {
            NumericCheck::Integer
        } else {
            NumericCheck::decimal(self.precision, self.scale)?
        };

        let mut checks = vec![format];
        for (comparison, expected) in &self.bounds {
            checks.push(NumericCheck::compare(*comparison, expected.clone())?);
        }
        Ok(checks)
    }
}

/// Where a format rule gets its matcher from.
#[derive(Clone)]
pub enum FormatSpec {
    /// Regular expression source.
    Regex(String),
    /// Name of a predefined format such as `email_address`.
    Named(String),
    Predicate(FormatFn),
}

impl FormatSpec {
    pub fn regex(source: impl Into<String>) -> Self {
        Self::Regex(source.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn matcher(&self) -> Result<FormatMatcher, DeclarationError> {
        match self {
            Self::Regex(source) => Pattern::new(source)
                .map(FormatMatcher::pattern)
                .map_err(|e| DeclarationError::InvalidPattern {
                    pattern: source.clone(),
                    reason: e.to_string(),
                }),
            Self::Named(name) => {
                predefined_format(name).ok_or_else(|| DeclarationError::UnknownFormat(name.clone()))
            }
            Self::Predicate(predicate) => Ok(FormatMatcher::Predicate(Arc::clone(predicate))),
        }
    }
}

impl fmt::Debug for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(source) => f.debug_tuple("Regex").field(source).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A rule kind with its parameters, not yet bound to an attribute.
#[derive(Clone, Debug)]
pub enum RuleSpec {
    Presence,
    Absence,
    Length(LengthSpec),
    Numeric(NumericSpec),
    Format(FormatSpec),
    Within(Within),
    /// Defaults to `<attribute>_confirmation`.
    Confirmation {
        confirm: Option<String>,
    },
    Uniqueness {
        scope: Vec<String>,
    },
    /// Defaults to `"1"`, `1`, `"true"`, `true`, and `"t"`.
    Acceptance {
        accept: Option<Vec<Value>>,
    },
    /// Method name defaults to the attribute name.
    Method {
        method: Option<String>,
        violation_type: Option<ViolationType>,
    },
    Block(Option<BlockFn>),
    PrimitiveType,
}

impl RuleSpec {
    pub fn within_set<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Within(Within::Set(values.into_iter().map(Into::into).collect()))
    }

    /// Inclusive numeric range.
    pub fn within_range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self::Within(Within::Range {
            min: Some(min.into()),
            max: Some(max.into()),
        })
    }

    pub fn at_least(min: impl Into<Value>) -> Self {
        Self::Within(Within::Range {
            min: Some(min.into()),
            max: None,
        })
    }

    pub fn at_most(max: impl Into<Value>) -> Self {
        Self::Within(Within::Range {
            min: None,
            max: Some(max.into()),
        })
    }

    pub fn confirmation() -> Self {
        Self::Confirmation { confirm: None }
    }

    pub fn uniqueness() -> Self {
        Self::Uniqueness { scope: Vec::new() }
    }

    pub fn acceptance() -> Self {
        Self::Acceptance { accept: None }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method {
            method: Some(name.into()),
            violation_type: None,
        }
    }

    pub fn block<F>(block: F) -> Self
    where
        F: Fn(&dyn Subject) -> MethodOutcome + Send + Sync + 'static,
    {
        Self::Block(Some(BlockFn::new(block)))
    }

    /// Build the rule kinds this spec declares on `attribute`.
    pub fn kinds_for(&self, attribute: &str) -> Result<Vec<RuleKind>, DeclarationError> {
        let kind = match self {
            Self::Presence => RuleKind::Presence,
            Self::Absence => RuleKind::Absence,
            Self::Length(spec) => RuleKind::Length(spec.resolve(attribute)?),
            Self::Numeric(spec) => {
                return Ok(spec.checks()?.into_iter().map(RuleKind::Numeric).collect())
            }
            Self::Format(spec) => RuleKind::Format(spec.matcher()?),
            Self::Within(within) => RuleKind::Within(checked_within(within)?),
            Self::Confirmation { confirm } => {
                let confirm = match confirm {
                    Some(target) if target.is_empty() => {
                        return Err(DeclarationError::MissingConfirmationTarget {
                            attribute: attribute.to_string(),
                        })
                    }
                    Some(target) => target.clone(),
                    None => crate::rules::default_confirmation_target(attribute),
                };
                RuleKind::Confirmation { confirm }
            }
            Self::Uniqueness { scope } => {
                if let Some(bad) = scope.iter().find(|s| s.trim().is_empty()) {
                    return Err(DeclarationError::InvalidScope {
                        attribute: attribute.to_string(),
                        scope: bad.clone(),
                    });
                }
                RuleKind::Uniqueness {
                    scope: scope.clone(),
                }
            }
            Self::Acceptance { accept } => RuleKind::Acceptance {
                accept: accept
                    .clone()
                    .unwrap_or_else(crate::rules::default_accepted_values),
            },
            Self::Method {
                method,
                violation_type,
            } => RuleKind::Method {
                method: method.clone().unwrap_or_else(|| attribute.to_string()),
                violation_type: violation_type.unwrap_or(ViolationType::UnsatisfiedCondition),
            },
            Self::Block(block) => RuleKind::Block(block.clone().ok_or_else(|| {
                DeclarationError::MissingBlock {
                    attribute: attribute.to_string(),
                }
            })?),
            Self::PrimitiveType => RuleKind::PrimitiveType,
        };
        Ok(vec![kind])
    }

    /// Build fully configured rules for `attribute`.
    pub fn rules_for(
        &self,
        attribute: &str,
        options: &RuleOptions,
    ) -> Result<Vec<Rule>, DeclarationError> {
        Ok(self
            .kinds_for(attribute)?
            .into_iter()
            .map(|kind| options.apply(Rule::new(attribute, kind)))
            .collect())
    }
}

fn checked_within(within: &Within) -> Result<Within, DeclarationError> {
    if let Within::Range { min, max } = within {
        let mut numbers = Vec::with_capacity(2);
        for bound in [min, max].into_iter().flatten() {
            numbers.push(
                as_number(bound).ok_or_else(|| DeclarationError::NonNumericBound(bound.clone()))?,
            );
        }
        let empty = matches!(numbers.as_slice(), [lo, hi] if lo > hi);
        if numbers.is_empty() || empty {
            return Err(DeclarationError::InvalidRange {
                min: min.clone(),
                max: max.clone(),
            });
        }
    }
    Ok(within.clone())
}

fn object(options: &Value) -> Result<&Map<String, Value>, DeclarationError> {
    options
        .as_object()
        .ok_or_else(|| invalid_option("options", options))
}

fn first<'a>(map: &'a Map<String, Value>, keys: &[&'a str]) -> Option<(&'a str, &'a Value)> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn invalid_option(option: &str, value: &Value) -> DeclarationError {
    DeclarationError::InvalidOption {
        option: option.to_string(),
        value: value.clone(),
    }
}

fn usize_value(key: &str, value: &Value) -> Result<usize, DeclarationError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid_option(key, value))
}

fn u32_value(key: &str, value: &Value) -> Result<u32, DeclarationError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid_option(key, value))
}

fn length_option(
    map: &Map<String, Value>,
    keys: &[&str],
) -> Result<Option<usize>, DeclarationError> {
    first(map, keys)
        .map(|(key, value)| usize_value(key, value))
        .transpose()
}

fn length_range(key: &str, value: &Value) -> Result<(usize, Option<usize>), DeclarationError> {
    match value.as_array().map(Vec::as_slice) {
        Some([min, max]) => {
            let max = if max.is_null() {
                None
            } else {
                Some(usize_value(key, max)?)
            };
            Ok((usize_value(key, min)?, max))
        }
        _ => Err(invalid_option(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn length_aliases_resolve() {
        let cases = [
            (json!({"is": 4}), LengthBound::Equal(4)),
            (json!({"equals": 4}), LengthBound::Equal(4)),
            (json!({"within": [2, 10]}), LengthBound::Range { min: 2, max: 10 }),
            (json!({"in": [1, 3]}), LengthBound::Range { min: 1, max: 3 }),
            (json!({"min": 2}), LengthBound::Minimum(2)),
            (json!({"minimum": 2}), LengthBound::Minimum(2)),
            (json!({"max": 9}), LengthBound::Maximum(9)),
            (json!({"maximum": 9}), LengthBound::Maximum(9)),
            (json!({"min": 2, "max": 9}), LengthBound::Range { min: 2, max: 9 }),
        ];

        for (options, expected) in cases {
            let spec = LengthSpec::from_options(&options).unwrap();
            assert_eq!(spec.resolve("name").unwrap(), expected, "{options}");
        }
    }

    #[test]
    fn infinite_length_range_is_rejected() {
        let spec = LengthSpec::from_options(&json!({"within": [3, null]})).unwrap();
        assert_eq!(
            spec.resolve("name"),
            Err(DeclarationError::InfiniteLengthRange {
                attribute: "name".into()
            })
        );
    }

    #[test]
    fn unbound_length_is_rejected() {
        assert!(matches!(
            LengthSpec::new().resolve("name"),
            Err(DeclarationError::UnboundLength { .. })
        ));
    }

    #[test]
    fn inverted_length_range_is_rejected() {
        assert!(matches!(
            LengthSpec::new().within(5, 2).resolve("name"),
            Err(DeclarationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn numeric_aliases_produce_format_and_comparisons() {
        let spec = NumericSpec::from_options(&json!({
            "integer_only": true,
            "greater_than_or_equal_to": 0,
            "lt": 100,
            "exactly": 42,
        }))
        .unwrap();

        let checks = spec.checks().unwrap();
        assert_eq!(checks[0], NumericCheck::Integer);
        assert_eq!(
            checks[1..],
            [
                NumericCheck::compare(Comparison::LessThan, 100).unwrap(),
                NumericCheck::compare(Comparison::GreaterThanOrEqual, 0).unwrap(),
                NumericCheck::compare(Comparison::Equal, 42).unwrap(),
            ]
        );
    }

    #[test]
    fn numeric_without_integer_flag_is_decimal() {
        let checks = NumericSpec::new().precision(5).scale(2).checks().unwrap();
        assert!(matches!(
            checks[0],
            NumericCheck::Decimal {
                precision: Some(5),
                scale: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn numeric_options_reject_wrong_types() {
        let result = NumericSpec::from_options(&json!({"only_integer": "yes"}));
        assert!(matches!(result, Err(DeclarationError::InvalidOption { .. })));
    }

    #[test]
    fn later_bound_replaces_earlier() {
        let checks = NumericSpec::new().gt(1).greater_than(5).checks().unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(
            checks[1],
            NumericCheck::compare(Comparison::GreaterThan, 5).unwrap()
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = RuleSpec::Format(FormatSpec::named("postcode")).kinds_for("zip");
        assert_eq!(result, Err(DeclarationError::UnknownFormat("postcode".into())));
    }

    #[test]
    fn bad_regex_is_rejected() {
        let result = RuleSpec::Format(FormatSpec::regex("(unclosed")).kinds_for("zip");
        assert!(matches!(result, Err(DeclarationError::InvalidPattern { .. })));
    }

    #[test]
    fn confirmation_target_defaults_and_validates() {
        let kinds = RuleSpec::confirmation().kinds_for("password").unwrap();
        assert_eq!(
            kinds,
            vec![RuleKind::Confirmation {
                confirm: "password_confirmation".into()
            }]
        );

        let result = RuleSpec::Confirmation {
            confirm: Some(String::new()),
        }
        .kinds_for("password");
        assert!(matches!(
            result,
            Err(DeclarationError::MissingConfirmationTarget { .. })
        ));
    }

    #[test]
    fn method_defaults_to_attribute_name() {
        let spec = RuleSpec::Method {
            method: None,
            violation_type: None,
        };
        assert_eq!(
            spec.kinds_for("check_totals").unwrap(),
            vec![RuleKind::Method {
                method: "check_totals".into(),
                violation_type: ViolationType::UnsatisfiedCondition,
            }]
        );
    }

    #[test]
    fn missing_block_is_rejected() {
        assert!(matches!(
            RuleSpec::Block(None).kinds_for("base"),
            Err(DeclarationError::MissingBlock { .. })
        ));
    }

    #[test]
    fn blank_scope_is_rejected() {
        let spec = RuleSpec::Uniqueness {
            scope: vec!["account_id".into(), " ".into()],
        };
        assert!(matches!(
            spec.kinds_for("email"),
            Err(DeclarationError::InvalidScope { .. })
        ));
    }

    #[test]
    fn within_ranges_are_checked() {
        assert!(RuleSpec::within_range(1, 5).kinds_for("rating").is_ok());
        assert!(RuleSpec::at_least(18).kinds_for("age").is_ok());
        assert!(matches!(
            RuleSpec::within_range(5, 1).kinds_for("rating"),
            Err(DeclarationError::InvalidRange { .. })
        ));
        assert!(matches!(
            RuleSpec::at_most("ten").kinds_for("rating"),
            Err(DeclarationError::NonNumericBound(_))
        ));
    }

    #[test]
    fn rules_for_applies_options() {
        let rules = RuleSpec::Numeric(NumericSpec::new().only_integer().gt(0))
            .rules_for("quantity", &RuleOptions::new().allow_nil(true))
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.allows_nil() == Some(true)));
        assert!(rules.iter().all(|r| r.attribute_name() == "quantity"));
    }
}
