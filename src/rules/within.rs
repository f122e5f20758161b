//! Inclusion in a discrete set or a numeric range.

use super::{Failure, Rule};
use crate::core::{as_number, display_value, loosely_equal};
use crate::validation::ViolationType;
use serde_json::Value;

/// Accepted values for an inclusion rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Within {
    Set(Vec<Value>),
    /// Inclusive numeric range; a missing bound is open on that side.
    Range { min: Option<Value>, max: Option<Value> },
}

impl Within {
    fn contains(&self, value: &Value) -> bool {
        match self {
            Self::Set(set) => set.iter().any(|item| loosely_equal(item, value)),
            Self::Range { min, max } => {
                let Some(n) = as_number(value) else {
                    return false;
                };
                let above = min.as_ref().and_then(as_number).map_or(true, |min| n >= min);
                let below = max.as_ref().and_then(as_number).map_or(true, |max| n <= max);
                above && below
            }
        }
    }

    fn failure(&self) -> Failure {
        match self {
            Self::Set(set) => {
                let joined = set.iter().map(display_value).collect::<Vec<_>>().join(", ");
                Failure::with_data(ViolationType::Inclusion, vec![Value::String(joined)])
            }
            Self::Range {
                min: Some(min),
                max: Some(max),
            } => Failure::with_data(ViolationType::ValueBetween, vec![min.clone(), max.clone()]),
            Self::Range {
                min: None,
                max: Some(max),
            } => Failure::with_data(ViolationType::LessThanOrEqualTo, vec![max.clone()]),
            Self::Range { min, max: None } => Failure::with_data(
                ViolationType::GreaterThanOrEqualTo,
                min.iter().cloned().collect(),
            ),
        }
    }

    pub(super) fn check(&self, rule: &Rule, value: Option<&Value>) -> Option<Failure> {
        if rule.is_optional(value) {
            return None;
        }

        let contained = value.is_some_and(|value| self.contains(value));
        (!contained).then(|| self.failure())
    }
}
