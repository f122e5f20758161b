//! Conformance of a value to its property's declared primitive type.

use super::{Failure, Rule};
use crate::core::Subject;
use crate::validation::ViolationType;
use serde_json::Value;

pub(super) fn check(rule: &Rule, subject: &dyn Subject, value: Option<&Value>) -> Option<Failure> {
    let value = match value {
        Some(value) if !value.is_null() => value,
        _ => return None,
    };
    let property = subject.property(rule.attribute_name())?;

    (!subject.conforms(value, property.primitive)).then(|| {
        Failure::with_data(
            ViolationType::Primitive,
            vec![Value::from(property.primitive.name())],
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PrimitiveType, Property};
    use crate::rules::RuleKind;
    use serde_json::json;

    struct Event {
        starts_at: Value,
    }

    impl Subject for Event {
        fn model_name(&self) -> &str {
            "Event"
        }

        fn attribute_value(&self, name: &str) -> Option<Value> {
            match name {
                "starts_at" => Some(self.starts_at.clone()),
                "notes" => Some(json!(42)),
                _ => None,
            }
        }

        fn property(&self, name: &str) -> Option<Property> {
            (name == "starts_at").then(|| Property::new(name, PrimitiveType::DateTime))
        }
    }

    #[test]
    fn conforming_and_nil_values_pass() {
        let rule = Rule::new("starts_at", RuleKind::PrimitiveType);
        let ok = Event {
            starts_at: json!("2024-05-01T09:30:00+02:00"),
        };
        let nil = Event {
            starts_at: Value::Null,
        };
        assert_eq!(rule.evaluate(&ok).unwrap(), None);
        assert_eq!(rule.evaluate(&nil).unwrap(), None);
    }

    #[test]
    fn mismatch_reports_type_name() {
        let rule = Rule::new("starts_at", RuleKind::PrimitiveType);
        let event = Event {
            starts_at: json!("next tuesday"),
        };
        let failure = rule.evaluate(&event).unwrap().unwrap();
        assert_eq!(failure.violation_type, ViolationType::Primitive);
        assert_eq!(failure.data, vec![json!("DateTime")]);
    }

    #[test]
    fn undeclared_attributes_are_not_checked() {
        let rule = Rule::new("notes", RuleKind::PrimitiveType);
        let event = Event {
            starts_at: Value::Null,
        };
        assert_eq!(rule.evaluate(&event).unwrap(), None);
    }
}
