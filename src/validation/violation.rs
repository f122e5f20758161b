//! Violations and the per-subject violation set.

use super::transformer::{default_transformer, MessageTransformer};
use crate::core::Subject;
use crate::rules::{Failure, Rule};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Stable identifier of the way a rule failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    Absent,
    Inclusion,
    Invalid,
    Confirmation,
    Accepted,
    Nil,
    Blank,
    LengthBetween,
    TooLong,
    TooShort,
    WrongLength,
    Taken,
    NotANumber,
    NotAnInteger,
    GreaterThan,
    GreaterThanOrEqualTo,
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    ValueBetween,
    Primitive,
    UnsatisfiedCondition,
}

impl ViolationType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Inclusion => "inclusion",
            Self::Invalid => "invalid",
            Self::Confirmation => "confirmation",
            Self::Accepted => "accepted",
            Self::Nil => "nil",
            Self::Blank => "blank",
            Self::LengthBetween => "length_between",
            Self::TooLong => "too_long",
            Self::TooShort => "too_short",
            Self::WrongLength => "wrong_length",
            Self::Taken => "taken",
            Self::NotANumber => "not_a_number",
            Self::NotAnInteger => "not_an_integer",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::LessThan => "less_than",
            Self::LessThanOrEqualTo => "less_than_or_equal_to",
            Self::ValueBetween => "value_between",
            Self::Primitive => "primitive",
            Self::UnsatisfiedCondition => "unsatisfied_condition",
        }
    }

    /// Default message template. `%s` placeholders take the humanized
    /// attribute name followed by the violation data, in order.
    pub fn template(self) -> Option<&'static str> {
        let template = match self {
            Self::Absent => "%s must be absent",
            Self::Inclusion => "%s must be one of %s",
            Self::Invalid => "%s has an invalid format",
            Self::Confirmation => "%s does not match the confirmation",
            Self::Accepted => "%s is not accepted",
            Self::Nil => "%s must not be nil",
            Self::Blank => "%s must not be blank",
            Self::LengthBetween => "%s must be between %s and %s characters long",
            Self::TooLong => "%s must be at most %s characters long",
            Self::TooShort => "%s must be at least %s characters long",
            Self::WrongLength => "%s must be %s characters long",
            Self::Taken => "%s is already taken",
            Self::NotANumber => "%s must be a number",
            Self::NotAnInteger => "%s must be an integer",
            Self::GreaterThan => "%s must be greater than %s",
            Self::GreaterThanOrEqualTo => "%s must be greater than or equal to %s",
            Self::EqualTo => "%s must be equal to %s",
            Self::NotEqualTo => "%s must not be equal to %s",
            Self::LessThan => "%s must be less than %s",
            Self::LessThanOrEqualTo => "%s must be less than or equal to %s",
            Self::ValueBetween => "%s must be between %s and %s",
            Self::Primitive => "%s must be of type %s",
            Self::UnsatisfiedCondition => return None,
        };
        Some(template)
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One failed rule for one subject.
///
/// A violation keeps its failure as data (type plus interpolation values)
/// and renders a message only when asked. Violations added by hand carry a
/// message and no rule.
#[derive(Clone)]
pub struct Violation {
    rule: Option<Arc<Rule>>,
    attribute_name: String,
    violation_type: Option<ViolationType>,
    violation_data: Vec<Value>,
    custom_message: Option<String>,
    transformer: Option<Arc<dyn MessageTransformer>>,
}

impl Violation {
    pub(crate) fn from_rule(rule: Arc<Rule>, subject: &dyn Subject, failure: Failure) -> Self {
        let attribute_name = rule.attribute_name().to_string();
        let custom_message = failure.message.or_else(|| {
            rule.custom_message()
                .map(|message| message.resolve(subject, &attribute_name))
        });

        Self {
            rule: Some(rule),
            attribute_name,
            violation_type: Some(failure.violation_type),
            violation_data: failure.data,
            custom_message,
            transformer: None,
        }
    }

    /// A message-only violation not produced by any rule.
    pub fn manual(attribute_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: None,
            attribute_name: attribute_name.into(),
            violation_type: None,
            violation_data: Vec::new(),
            custom_message: Some(message.into()),
            transformer: None,
        }
    }

    /// Report the violation under a different attribute.
    pub fn with_attribute_name(mut self, attribute_name: impl Into<String>) -> Self {
        self.attribute_name = attribute_name.into();
        self
    }

    pub(crate) fn with_transformer(mut self, transformer: Option<Arc<dyn MessageTransformer>>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_deref()
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn violation_type(&self) -> Option<ViolationType> {
        self.violation_type
    }

    pub fn violation_data(&self) -> &[Value] {
        &self.violation_data
    }

    pub fn custom_message(&self) -> Option<&str> {
        self.custom_message.as_deref()
    }

    /// Human-readable message.
    ///
    /// A custom message wins; otherwise the transformer of the rule set that
    /// produced the violation renders it, falling back to the process-wide
    /// default transformer.
    pub fn message(&self) -> String {
        match (&self.custom_message, &self.transformer) {
            (Some(message), _) => message.clone(),
            (None, Some(transformer)) => transformer.transform(self),
            (None, None) => default_transformer().transform(self),
        }
    }

    /// Message rendered with an explicit transformer, unless a custom message
    /// was given.
    pub fn message_with(&self, transformer: &dyn MessageTransformer) -> String {
        self.custom_message
            .clone()
            .unwrap_or_else(|| transformer.transform(self))
    }
}

impl PartialEq for Violation {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
            && self.custom_message == other.custom_message
            && self.attribute_name == other.attribute_name
    }
}

impl fmt::Debug for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Violation")
            .field("attribute_name", &self.attribute_name)
            .field("violation_type", &self.violation_type)
            .field("violation_data", &self.violation_data)
            .field("custom_message", &self.custom_message)
            .field("rule", &self.rule)
            .finish()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Violations of one subject, grouped by attribute in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViolationSet {
    violations: IndexMap<String, Vec<Violation>>,
}

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: Violation) {
        self.violations
            .entry(violation.attribute_name.clone())
            .or_default()
            .push(violation);
    }

    /// Add a message-only violation.
    pub fn add_message(&mut self, attribute_name: impl Into<String>, message: impl Into<String>) {
        self.add(Violation::manual(attribute_name, message));
    }

    /// Violations on `attribute_name` with duplicates removed, or `None`
    /// when there are none.
    pub fn on(&self, attribute_name: &str) -> Option<Vec<&Violation>> {
        let mut unique: Vec<&Violation> = Vec::new();
        for violation in self.violations.get(attribute_name)? {
            if !unique.contains(&violation) {
                unique.push(violation);
            }
        }
        (!unique.is_empty()).then_some(unique)
    }

    /// Every message, in attribute order.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter().map(Violation::message).collect()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.violations
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.violations.clear();
    }

    /// Accumulated outcome: success when empty, otherwise every violation.
    pub fn into_validation(self) -> Validation<(), NonEmptyVec<Violation>> {
        let checks = self
            .violations
            .into_values()
            .flatten()
            .map(Validation::fail)
            .collect::<Vec<Validation<(), NonEmptyVec<Violation>>>>();

        if checks.is_empty() {
            Validation::success(())
        } else {
            Validation::all_vec(checks).map(|_| ())
        }
    }
}

impl Extend<Violation> for ViolationSet {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        for violation in iter {
            self.add(violation);
        }
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = Box<dyn Iterator<Item = &'a Violation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LengthBound, Message, RuleKind};
    use serde_json::json;

    struct Post;

    impl Subject for Post {
        fn model_name(&self) -> &str {
            "Post"
        }

        fn attribute_value(&self, name: &str) -> Option<Value> {
            (name == "title").then(|| json!("an overly long title"))
        }
    }

    fn too_long(rule: Rule) -> Violation {
        let rule = Arc::new(rule);
        Rule::check(&rule, &Post).unwrap().unwrap()
    }

    #[test]
    fn default_message_interpolates_attribute_and_data() {
        let violation = too_long(Rule::new("title", RuleKind::Length(LengthBound::Maximum(5))));

        assert_eq!(violation.violation_type(), Some(ViolationType::TooLong));
        assert_eq!(violation.violation_data(), &[json!(5)]);
        assert_eq!(violation.message(), "Title must be at most 5 characters long");
    }

    #[test]
    fn custom_message_wins() {
        let violation = too_long(
            Rule::new("title", RuleKind::Length(LengthBound::Maximum(5))).message("keep it short"),
        );
        assert_eq!(violation.message(), "keep it short");
        assert_eq!(violation.to_string(), "keep it short");
    }

    #[test]
    fn dynamic_message_sees_subject() {
        let rule = Rule::new("title", RuleKind::Length(LengthBound::Maximum(5))).message(
            Message::dynamic(|subject, _| format!("{} title too long", subject.model_name())),
        );
        assert_eq!(too_long(rule).message(), "Post title too long");
    }

    #[test]
    fn on_deduplicates_and_returns_none_when_empty() {
        let violation = too_long(Rule::new("title", RuleKind::Length(LengthBound::Maximum(5))));
        let mut set = ViolationSet::new();
        set.add(violation.clone());
        set.add(violation);
        set.add_message("base", "something went wrong");

        assert_eq!(set.len(), 3);
        assert_eq!(set.on("title").map(|v| v.len()), Some(1));
        assert!(set.on("body").is_none());
        assert_eq!(set.attributes().collect::<Vec<_>>(), vec!["title", "base"]);
        assert_eq!(set.full_messages()[2], "something went wrong");
    }

    #[test]
    fn attribute_override() {
        let violation = Violation::manual("title", "bad").with_attribute_name("base");
        let set: ViolationSet = [violation].into_iter().collect();
        assert!(set.on("base").is_some());
        assert!(set.on("title").is_none());
    }

    #[test]
    fn into_validation_accumulates_everything() {
        let mut set = ViolationSet::new();
        assert!(set.clone().into_validation().is_success());

        set.add_message("a", "first");
        set.add_message("b", "second");
        match set.into_validation() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|v| v.attribute_name() == "b"));
            }
            Validation::Success(_) => panic!("expected failures"),
        }
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = ViolationSet::new();
        set.add_message("a", "first");
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn violation_types_serialize_snake_case() {
        let json = serde_json::to_string(&ViolationType::GreaterThanOrEqualTo).unwrap();
        assert_eq!(json, "\"greater_than_or_equal_to\"");
        assert_eq!(ViolationType::NotAnInteger.to_string(), "not_an_integer");
        assert_eq!(ViolationType::UnsatisfiedCondition.template(), None);
    }
}
