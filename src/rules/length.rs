//! Length checks, measured in characters of the value's string form.

use super::{Failure, Rule};
use crate::core::display_value;
use crate::validation::ViolationType;
use serde_json::Value;

/// Accepted length of an attribute's string form. All bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthBound {
    Equal(usize),
    Minimum(usize),
    Maximum(usize),
    Range { min: usize, max: usize },
}

impl LengthBound {
    pub fn admits(&self, length: usize) -> bool {
        match *self {
            Self::Equal(expected) => length == expected,
            Self::Minimum(min) => length >= min,
            Self::Maximum(max) => length <= max,
            Self::Range { min, max } => (min..=max).contains(&length),
        }
    }

    pub fn violation_type(&self) -> ViolationType {
        match self {
            Self::Equal(_) => ViolationType::WrongLength,
            Self::Minimum(_) => ViolationType::TooShort,
            Self::Maximum(_) => ViolationType::TooLong,
            Self::Range { .. } => ViolationType::LengthBetween,
        }
    }

    fn violation_data(&self) -> Vec<Value> {
        match *self {
            Self::Equal(n) | Self::Minimum(n) | Self::Maximum(n) => vec![Value::from(n)],
            Self::Range { min, max } => vec![Value::from(min), Value::from(max)],
        }
    }

    pub(super) fn check(&self, rule: &Rule, value: Option<&Value>) -> Option<Failure> {
        if rule.is_optional(value) {
            return None;
        }

        let length = value.map(display_value).unwrap_or_default().chars().count();
        if self.admits(length) {
            None
        } else {
            Some(Failure::with_data(self.violation_type(), self.violation_data()))
        }
    }
}
