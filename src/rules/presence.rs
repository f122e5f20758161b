//! Presence and absence checks.

use super::{Failure, Rule};
use crate::core::{is_blank, is_nil, PrimitiveType, Subject};
use crate::validation::ViolationType;
use serde_json::Value;

/// Boolean properties are present when non-nil (`false` counts); everything
/// else must be non-blank.
pub(super) fn check_presence(
    rule: &Rule,
    subject: &dyn Subject,
    value: Option<&Value>,
) -> Option<Failure> {
    let boolean = subject
        .property(rule.attribute_name())
        .is_some_and(|property| property.primitive == PrimitiveType::Boolean);

    if boolean {
        is_nil(value).then(|| Failure::new(ViolationType::Nil))
    } else {
        is_blank(value).then(|| Failure::new(ViolationType::Blank))
    }
}

pub(super) fn check_absence(value: Option<&Value>) -> Option<Failure> {
    (!is_blank(value)).then(|| Failure::new(ViolationType::Absent))
}
