//! Acceptance of terms-style fields.

use super::{Failure, Rule};
use crate::core::{is_nil, loosely_equal};
use crate::validation::ViolationType;
use serde_json::{json, Value};

/// Values accepted when none are declared.
pub(crate) fn default_accepted() -> Vec<Value> {
    vec![json!("1"), json!(1), json!("true"), json!(true), json!("t")]
}

pub(super) fn check(rule: &Rule, value: Option<&Value>, accept: &[Value]) -> Option<Failure> {
    if is_nil(value) && rule.allows_nil() == Some(true) {
        return None;
    }

    let accepted = value.is_some_and(|value| accept.iter().any(|a| loosely_equal(a, value)));
    (!accepted).then(|| Failure::new(ViolationType::Accepted))
}
