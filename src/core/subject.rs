//! The subject contract and the collaborators it exposes.
//!
//! A subject is any structured object that can be validated. The engine never
//! touches fields directly: it reads attribute values, schema metadata, and
//! dirty-tracking information through the [`Subject`] trait, so hosts can
//! expose virtual attributes and plug in their own persistence layer.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identity of a persisted subject.
pub type Identity = Uuid;

/// Primitive (logical) type of a declared property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    DateTime,
    Date,
    Array,
    Object,
}

impl PrimitiveType {
    /// Name used in violation data and messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Array => "Array",
            Self::Object => "Object",
        }
    }

    /// Check whether a non-nil value conforms to this primitive type.
    ///
    /// Date and time values are carried as strings: RFC 3339 for
    /// `DateTime`, `YYYY-MM-DD` for `Date`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use validity::core::PrimitiveType;
    /// use serde_json::json;
    ///
    /// assert!(PrimitiveType::Integer.conforms(&json!(7)));
    /// assert!(!PrimitiveType::Integer.conforms(&json!(7.5)));
    /// assert!(PrimitiveType::DateTime.conforms(&json!("2024-05-01T10:00:00Z")));
    /// assert!(!PrimitiveType::Date.conforms(&json!("yesterday")));
    /// ```
    pub fn conforms(&self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float | Self::Decimal => value.is_number(),
            Self::String => value.is_string(),
            Self::DateTime => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema metadata for one declared property of a subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub primitive: PrimitiveType,
    /// Lazy properties are not loaded with the rest of the subject.
    #[serde(default)]
    pub lazy: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            primitive,
            lazy: false,
        }
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

/// Result of a custom validation method or block.
#[derive(Clone, Debug, PartialEq)]
pub enum MethodOutcome {
    Valid,
    /// Invalid, optionally with a message that replaces the default one.
    Invalid(Option<String>),
}

impl MethodOutcome {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(Some(message.into()))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for MethodOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid(None)
        }
    }
}

impl From<(bool, String)> for MethodOutcome {
    fn from((valid, message): (bool, String)) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid(Some(message))
        }
    }
}

/// Failure reported by a uniqueness lookup collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("uniqueness lookup failed: {0}")]
pub struct LookupError(pub String);

/// Collaborator that finds already-persisted subjects for uniqueness checks.
pub trait UniquenessLookup: Send + Sync {
    /// Find a persisted subject of `model` whose `key` and `scope` fields all
    /// match, returning its identity.
    fn find_existing(
        &self,
        model: &str,
        key: &[(String, Value)],
        scope: &[(String, Value)],
    ) -> Result<Option<Identity>, LookupError>;

    /// Identity of `subject` as seen by this lookup.
    fn subject_identity(&self, subject: &dyn Subject) -> Option<Identity> {
        subject.identity()
    }
}

/// Contract a host object fulfils to be validated.
///
/// Only [`model_name`](Subject::model_name) and
/// [`attribute_value`](Subject::attribute_value) are required. The defaults
/// describe a plain, never-persisted object with no schema.
pub trait Subject {
    /// Name of the subject's type, used for uniqueness lookups.
    fn model_name(&self) -> &str;

    /// Value of an attribute, real or virtual. `None` when unknown.
    fn attribute_value(&self, name: &str) -> Option<Value>;

    /// Schema metadata for a declared property.
    fn property(&self, _name: &str) -> Option<Property> {
        None
    }

    /// Names of all properties the subject's schema declares.
    fn declared_attributes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Names of declared properties changed since the subject was last persisted.
    fn changed_attributes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// True until the subject has been persisted.
    fn is_new(&self) -> bool {
        true
    }

    /// Whether a declared property's value has been loaded.
    fn is_loaded(&self, _name: &str) -> bool {
        true
    }

    /// Request a batch load of not-yet-loaded properties.
    fn eager_load(&self, _names: &[String]) {}

    /// Evaluate a named zero-argument condition. `None` when the subject has no
    /// such condition.
    fn condition(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Invoke a named validation method. `None` when the subject has no such
    /// method.
    fn call_method(&self, _name: &str) -> Option<MethodOutcome> {
        None
    }

    /// Identity of the persisted subject, if any.
    fn identity(&self) -> Option<Identity> {
        None
    }

    /// Collaborator used by uniqueness rules.
    fn uniqueness_lookup(&self) -> Option<&dyn UniquenessLookup> {
        None
    }

    /// Check a non-nil value against a declared primitive type.
    fn conforms(&self, value: &Value, primitive: PrimitiveType) -> bool {
        primitive.conforms(value)
    }
}
