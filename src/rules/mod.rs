//! Rules and the catalog of rule kinds.
//!
//! A [`Rule`] binds one check to one attribute. The check itself is a
//! variant of the closed [`RuleKind`] enum; everything the variants share
//! (guards, nil/blank skipping, custom messages) lives on `Rule`.
//!
//! Rules are immutable once built and compare structurally, which lets a
//! rule set drop duplicate declarations.

mod acceptance;
mod confirmation;
mod format;
mod length;
mod method;
mod numeric;
mod presence;
mod primitive;
mod uniqueness;
mod within;

pub use format::{predefined_format, FormatFn, FormatMatcher, Pattern};
pub use length::LengthBound;
pub use method::BlockFn;
pub use numeric::{decimal_pattern, Comparison, NumericCheck};
pub use within::Within;

pub(crate) use acceptance::default_accepted as default_accepted_values;
pub(crate) use confirmation::default_target as default_confirmation_target;

use crate::core::{Guard, Property, Subject};
use crate::validation::{ValidationError, Violation, ViolationType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Builds a custom message from the subject and the property being validated.
pub type MessageFn = Arc<dyn Fn(&dyn Subject, Option<&Property>) -> String + Send + Sync>;

/// Custom message attached to a rule at declaration time.
#[derive(Clone)]
pub enum Message {
    Text(String),
    Dynamic(MessageFn),
}

impl Message {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn Subject, Option<&Property>) -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Produce the final message text for `attribute` on `subject`.
    pub fn resolve(&self, subject: &dyn Subject, attribute: &str) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Dynamic(f) => {
                let property = subject.property(attribute);
                f(subject, property.as_ref())
            }
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// The concrete check a rule performs, with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    Presence,
    Absence,
    Length(LengthBound),
    Numeric(NumericCheck),
    Format(FormatMatcher),
    Within(Within),
    /// Compare against a companion confirmation attribute.
    Confirmation {
        confirm: String,
    },
    /// No other persisted subject shares the value (within `scope`).
    Uniqueness {
        scope: Vec<String>,
    },
    Acceptance {
        accept: Vec<Value>,
    },
    /// Named validation method on the subject.
    Method {
        method: String,
        violation_type: ViolationType,
    },
    /// Inline validation block.
    Block(BlockFn),
    PrimitiveType,
}

impl RuleKind {
    pub fn tag(&self) -> RuleKindTag {
        match self {
            Self::Presence => RuleKindTag::Presence,
            Self::Absence => RuleKindTag::Absence,
            Self::Length(_) => RuleKindTag::Length,
            Self::Numeric(_) => RuleKindTag::Numeric,
            Self::Format(_) => RuleKindTag::Format,
            Self::Within(_) => RuleKindTag::Within,
            Self::Confirmation { .. } => RuleKindTag::Confirmation,
            Self::Uniqueness { .. } => RuleKindTag::Uniqueness,
            Self::Acceptance { .. } => RuleKindTag::Acceptance,
            Self::Method { .. } => RuleKindTag::Method,
            Self::Block(_) => RuleKindTag::Block,
            Self::PrimitiveType => RuleKindTag::PrimitiveType,
        }
    }
}

/// Parameter-free name of a rule kind, used in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKindTag {
    Presence,
    Absence,
    Length,
    Numeric,
    Format,
    Within,
    Confirmation,
    Uniqueness,
    Acceptance,
    Method,
    Block,
    PrimitiveType,
}

/// A failed check, before it is attached to a subject as a [`Violation`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Failure {
    pub violation_type: ViolationType,
    pub data: Vec<Value>,
    pub message: Option<String>,
}

impl Failure {
    pub fn new(violation_type: ViolationType) -> Self {
        Self {
            violation_type,
            data: Vec::new(),
            message: None,
        }
    }

    pub fn with_data(violation_type: ViolationType, data: Vec<Value>) -> Self {
        Self {
            violation_type,
            data,
            message: None,
        }
    }
}

/// A single check bound to one attribute.
///
/// # Example
///
/// ```rust
/// use validity::rules::{LengthBound, Rule, RuleKind};
///
/// let rule = Rule::new("title", RuleKind::Length(LengthBound::Maximum(20))).allow_nil(true);
/// assert_eq!(rule.attribute_name(), "title");
/// assert!(rule.is_optional(None));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    attribute_name: String,
    guard: Guard,
    allow_nil: Option<bool>,
    allow_blank: Option<bool>,
    message: Option<Message>,
    kind: RuleKind,
}

impl Rule {
    /// Create a rule with no guards, no custom message, and the kind's
    /// default nil/blank handling.
    pub fn new(attribute_name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            guard: Guard::none(),
            allow_nil: None,
            allow_blank: None,
            message: None,
            kind,
        }
        .normalized()
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = Some(allow);
        self.normalized()
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = Some(allow);
        self.normalized()
    }

    pub fn message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    // Presence and absence must see nil/blank values; a few kinds skip
    // them unless told otherwise.
    fn normalized(mut self) -> Self {
        match self.kind {
            RuleKind::Presence | RuleKind::Absence => {
                self.allow_nil = Some(false);
                self.allow_blank = Some(false);
            }
            RuleKind::Acceptance { .. } => {
                self.allow_nil = self.allow_nil.or(Some(true));
            }
            RuleKind::Confirmation { .. } | RuleKind::Uniqueness { .. } => {
                self.allow_nil = self.allow_nil.or(Some(true));
                self.allow_blank = self.allow_blank.or(Some(true));
            }
            _ => {}
        }
        self
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn guards(&self) -> &Guard {
        &self.guard
    }

    pub fn custom_message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn allows_nil(&self) -> Option<bool> {
        self.allow_nil
    }

    pub fn allows_blank(&self) -> Option<bool> {
        self.allow_blank
    }

    /// Evaluate the rule's guards against `subject`.
    pub fn applies_to(&self, subject: &dyn Subject) -> Result<bool, ValidationError> {
        self.guard.check(subject)
    }

    /// Whether `value` is an absent optional value this rule should skip.
    ///
    /// For nil, an undeclared `allow_nil` defers to `allow_blank`.
    pub fn is_optional(&self, value: Option<&Value>) -> bool {
        if crate::core::is_nil(value) {
            self.allow_nil.or(self.allow_blank).unwrap_or(false)
        } else if crate::core::is_blank(value) {
            self.allow_blank.unwrap_or(false)
        } else {
            false
        }
    }

    pub(crate) fn evaluate(&self, subject: &dyn Subject) -> Result<Option<Failure>, ValidationError> {
        let value = subject.attribute_value(&self.attribute_name);
        let value = value.as_ref();

        let failure = match &self.kind {
            RuleKind::Presence => presence::check_presence(self, subject, value),
            RuleKind::Absence => presence::check_absence(value),
            RuleKind::Length(bound) => bound.check(self, value),
            RuleKind::Numeric(check) => check.check(self, value),
            RuleKind::Format(matcher) => matcher.check(self, value),
            RuleKind::Within(within) => within.check(self, value),
            RuleKind::Confirmation { confirm } => {
                confirmation::check(self, subject, value, confirm)
            }
            RuleKind::Uniqueness { scope } => return uniqueness::check(self, subject, value, scope),
            RuleKind::Acceptance { accept } => acceptance::check(self, value, accept),
            RuleKind::Method {
                method,
                violation_type,
            } => return method::check_method(subject, method, *violation_type),
            RuleKind::Block(block) => method::check_block(subject, block),
            RuleKind::PrimitiveType => primitive::check(self, subject, value),
        };
        Ok(failure)
    }

    /// Run the rule against `subject`, producing a violation on failure.
    ///
    /// Guards are not consulted here; see [`Rule::applies_to`].
    pub fn check(rule: &Arc<Rule>, subject: &dyn Subject) -> Result<Option<Violation>, ValidationError> {
        Ok(rule
            .evaluate(subject)?
            .map(|failure| Violation::from_rule(Arc::clone(rule), subject, failure)))
    }
}
