//! Guards that decide whether a rule applies to a subject.
//!
//! A rule may carry an `if` condition, an `unless` condition, or both. When
//! both are present the `unless` condition wins and the `if` condition is
//! never evaluated.

use super::subject::Subject;
use crate::validation::ValidationError;
use std::fmt;
use std::sync::Arc;

/// Predicate over a subject, used for inline conditions.
pub type Predicate = Arc<dyn Fn(&dyn Subject) -> bool + Send + Sync>;

/// A condition is either the name of a zero-argument condition on the
/// subject, or an inline predicate.
#[derive(Clone)]
pub enum Condition {
    Method(String),
    Predicate(Predicate),
}

impl Condition {
    /// Condition resolved by name through [`Subject::condition`].
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    /// Condition evaluated by calling `predicate` with the subject.
    ///
    /// # Example
    ///
    /// ```rust
    /// use validity::core::{Condition, Subject};
    ///
    /// let has_email = Condition::predicate(|s: &dyn Subject| s.attribute_value("email").is_some());
    /// ```
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Subject) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Evaluate the condition against a subject.
    ///
    /// Fails when a named condition does not exist on the subject.
    pub fn evaluate(&self, subject: &dyn Subject) -> Result<bool, ValidationError> {
        match self {
            Self::Method(name) => {
                subject
                    .condition(name)
                    .ok_or_else(|| ValidationError::UnknownCondition {
                        model: subject.model_name().to_string(),
                        name: name.clone(),
                    })
            }
            Self::Predicate(predicate) => Ok(predicate(subject)),
        }
    }
}

impl From<&str> for Condition {
    fn from(name: &str) -> Self {
        Self::method(name)
    }
}

impl From<String> for Condition {
    fn from(name: String) -> Self {
        Self::Method(name)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Method(a), Self::Method(b)) => a == b,
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// The `if`/`unless` pair attached to a rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Guard {
    pub if_clause: Option<Condition>,
    pub unless_clause: Option<Condition>,
}

impl Guard {
    /// A guard that always lets the rule run.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.if_clause.is_none() && self.unless_clause.is_none()
    }

    /// Check whether the guarded rule applies to `subject`.
    pub fn check(&self, subject: &dyn Subject) -> Result<bool, ValidationError> {
        if let Some(unless) = &self.unless_clause {
            Ok(!unless.evaluate(subject)?)
        } else if let Some(when) = &self.if_clause {
            when.evaluate(subject)
        } else {
            Ok(true)
        }
    }
}
