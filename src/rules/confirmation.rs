//! Confirmation: an attribute must equal its companion confirmation field.

use super::{Failure, Rule};
use crate::core::{loosely_equal, Subject};
use crate::validation::ViolationType;
use serde_json::Value;

/// Name of the companion field used when none is declared.
pub(crate) fn default_target(attribute_name: &str) -> String {
    format!("{attribute_name}_confirmation")
}

pub(super) fn check(
    rule: &Rule,
    subject: &dyn Subject,
    value: Option<&Value>,
    confirm: &str,
) -> Option<Failure> {
    if rule.is_optional(value) {
        return None;
    }

    let attribute = rule.attribute_name();
    // Persisted properties only need confirming when they were just edited.
    if subject.property(attribute).is_some() && !subject.changed_attributes().contains(attribute) {
        return None;
    }

    let confirmed = subject.attribute_value(confirm);
    let matches = match (value, confirmed.as_ref()) {
        (Some(value), Some(confirmed)) => loosely_equal(value, confirmed),
        (None, None) => true,
        _ => false,
    };
    (!matches).then(|| Failure::new(ViolationType::Confirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PrimitiveType, Property};
    use crate::rules::RuleKind;
    use serde_json::json;
    use std::collections::BTreeSet;

    struct Signup {
        password: Option<&'static str>,
        confirmation: Option<&'static str>,
        dirty: bool,
        schema: bool,
    }

    impl Subject for Signup {
        fn model_name(&self) -> &str {
            "Signup"
        }

        fn attribute_value(&self, name: &str) -> Option<Value> {
            match name {
                "password" => self.password.map(|s| json!(s)),
                "password_confirmation" => self.confirmation.map(|s| json!(s)),
                _ => None,
            }
        }

        fn property(&self, name: &str) -> Option<Property> {
            (self.schema && name == "password").then(|| Property::new(name, PrimitiveType::String))
        }

        fn changed_attributes(&self) -> BTreeSet<String> {
            if self.dirty {
                BTreeSet::from(["password".to_string()])
            } else {
                BTreeSet::new()
            }
        }
    }

    fn rule() -> Rule {
        Rule::new(
            "password",
            RuleKind::Confirmation {
                confirm: default_target("password"),
            },
        )
    }

    #[test]
    fn matching_confirmation_is_valid() {
        let signup = Signup {
            password: Some("hunter2"),
            confirmation: Some("hunter2"),
            dirty: true,
            schema: true,
        };
        assert_eq!(rule().evaluate(&signup).unwrap(), None);
    }

    #[test]
    fn mismatch_on_fresh_edit_fails() {
        let signup = Signup {
            password: Some("hunter2"),
            confirmation: Some("hunter3"),
            dirty: true,
            schema: true,
        };
        let failure = rule().evaluate(&signup).unwrap().unwrap();
        assert_eq!(failure.violation_type, ViolationType::Confirmation);
    }

    #[test]
    fn unchanged_schema_property_short_circuits() {
        let signup = Signup {
            password: Some("hunter2"),
            confirmation: None,
            dirty: false,
            schema: true,
        };
        assert_eq!(rule().evaluate(&signup).unwrap(), None);
    }

    #[test]
    fn virtual_attribute_is_always_compared() {
        let signup = Signup {
            password: Some("hunter2"),
            confirmation: None,
            dirty: false,
            schema: false,
        };
        assert!(rule().evaluate(&signup).unwrap().is_some());
    }

    #[test]
    fn nil_is_skipped_by_default() {
        let signup = Signup {
            password: None,
            confirmation: Some("hunter2"),
            dirty: true,
            schema: true,
        };
        assert_eq!(rule().evaluate(&signup).unwrap(), None);
    }
}
