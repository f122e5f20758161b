//! Rules inferred from property declarations.
//!
//! A property declared with a kind, length, format, and so on implies a set
//! of rules: a required string property gets presence and a maximum length,
//! an integer property gets an integer check, and so on. Every inferred rule
//! tolerates nil, so an unset optional property only trips presence.

use super::error::DeclarationError;
use super::options::RuleOptions;
use super::spec::{FormatSpec, LengthSpec, NumericSpec, RuleSpec};
use crate::core::{PrimitiveType, Property};
use crate::rules::predefined_format;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default maximum length of a string property.
pub const DEFAULT_STRING_LENGTH: usize = 50;

/// Default maximum length of a text property.
pub const DEFAULT_TEXT_LENGTH: usize = 65_535;

/// Declared kind of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Auto-incrementing integer key.
    Serial,
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Text,
    DateTime,
    Date,
    Array,
    Object,
}

impl PropertyKind {
    pub fn primitive(self) -> PrimitiveType {
        match self {
            Self::Serial | Self::Integer => PrimitiveType::Integer,
            Self::Boolean => PrimitiveType::Boolean,
            Self::Float => PrimitiveType::Float,
            Self::Decimal => PrimitiveType::Decimal,
            Self::String | Self::Text => PrimitiveType::String,
            Self::DateTime => PrimitiveType::DateTime,
            Self::Date => PrimitiveType::Date,
            Self::Array => PrimitiveType::Array,
            Self::Object => PrimitiveType::Object,
        }
    }
}

/// Declared length: a maximum, or an inclusive `[min, max]` range where a
/// `null` max means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthLimit {
    Maximum(usize),
    Range(usize, Option<usize>),
}

/// Uniqueness declaration: `true`, or the names of scoping attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Unique {
    Flag(bool),
    Scope(Vec<String>),
}

fn enabled() -> bool {
    true
}

/// A property declaration carrying everything rule inference needs.
///
/// # Example
///
/// ```rust
/// use validity::builder::{infer_rules, PropertySpec};
/// use serde_json::json;
///
/// let spec: PropertySpec = serde_json::from_value(json!({
///     "name": "email",
///     "kind": "string",
///     "required": true,
///     "format": "email_address",
///     "unique": true,
/// }))
/// .unwrap();
///
/// // presence, length, format, uniqueness, primitive type
/// assert_eq!(infer_rules(&spec).unwrap().len(), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub required: bool,
    /// Defaults to the opposite of `required`.
    #[serde(default)]
    pub allow_blank: Option<bool>,
    #[serde(default)]
    pub length: Option<LengthLimit>,
    /// Predefined format name, or a regular expression.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub unique: Option<Unique>,
    #[serde(default)]
    pub set: Option<Vec<Value>>,
    #[serde(default)]
    pub min: Option<Value>,
    #[serde(default)]
    pub max: Option<Value>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub lazy: bool,
    /// Contexts the inferred rules go into.
    #[serde(default)]
    pub validates: Option<Vec<String>>,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-check messages keyed by `presence`, `length`, `format`,
    /// `is_unique`, `within`, `is_number`, or `is_primitive`.
    #[serde(default)]
    pub messages: HashMap<String, String>,
    #[serde(default = "enabled")]
    pub auto_validation: bool,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            allow_blank: None,
            length: None,
            format: None,
            unique: None,
            set: None,
            min: None,
            max: None,
            precision: None,
            scale: None,
            lazy: false,
            validates: None,
            message: None,
            messages: HashMap::new(),
            auto_validation: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn length(mut self, length: LengthLimit) -> Self {
        self.length = Some(length);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn unique(mut self, unique: Unique) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn set<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn min(mut self, min: impl Into<Value>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Value>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn validates<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validates = Some(contexts.into_iter().map(Into::into).collect());
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn without_auto_validation(mut self) -> Self {
        self.auto_validation = false;
        self
    }

    pub fn allows_blank(&self) -> bool {
        self.allow_blank.unwrap_or(!self.required)
    }

    /// Schema metadata subjects expose for this property.
    pub fn property(&self) -> Property {
        Property {
            name: self.name.clone(),
            primitive: self.kind.primitive(),
            lazy: self.lazy,
        }
    }

    fn options_for(&self, check: &str) -> RuleOptions {
        let mut options = RuleOptions::new().allow_nil(true);
        if let Some(contexts) = &self.validates {
            options = options.context(contexts.iter().cloned());
        }
        if let Some(message) = self.messages.get(check).or(self.message.as_ref()) {
            options = options.message(message.as_str());
        }
        options
    }
}

/// Rules implied by a property declaration, with their options.
pub fn infer_rules(
    property: &PropertySpec,
) -> Result<Vec<(RuleSpec, RuleOptions)>, DeclarationError> {
    if !property.auto_validation {
        return Ok(Vec::new());
    }

    let mut rules = Vec::new();

    if !property.allows_blank() && property.kind != PropertyKind::Serial {
        rules.push((RuleSpec::Presence, property.options_for("presence")));
    }

    if let Some(length) = inferred_length(property)? {
        rules.push((RuleSpec::Length(length), property.options_for("length")));
    }

    if let Some(format) = &property.format {
        let spec = if predefined_format(format).is_some() {
            FormatSpec::named(format.as_str())
        } else {
            FormatSpec::regex(format.as_str())
        };
        rules.push((RuleSpec::Format(spec), property.options_for("format")));
    }

    let scope = match &property.unique {
        Some(Unique::Flag(true)) => Some(Vec::new()),
        Some(Unique::Scope(scope)) => Some(scope.clone()),
        Some(Unique::Flag(false)) | None => None,
    };
    if let Some(scope) = scope {
        rules.push((
            RuleSpec::Uniqueness { scope },
            property.options_for("is_unique"),
        ));
    }

    if let Some(set) = &property.set {
        rules.push((
            RuleSpec::within_set(set.iter().cloned()),
            property.options_for("within"),
        ));
    }

    rules.push(inferred_type(property));
    Ok(rules)
}

fn inferred_length(property: &PropertySpec) -> Result<Option<LengthSpec>, DeclarationError> {
    let default = match property.kind {
        PropertyKind::String => DEFAULT_STRING_LENGTH,
        PropertyKind::Text => DEFAULT_TEXT_LENGTH,
        _ => return Ok(None),
    };

    let spec = match property.length.unwrap_or(LengthLimit::Maximum(default)) {
        LengthLimit::Maximum(max) => LengthSpec::new().maximum(max),
        LengthLimit::Range(_, None) => {
            return Err(DeclarationError::InfiniteLengthRange {
                attribute: property.name.clone(),
            })
        }
        LengthLimit::Range(min, max) => LengthSpec::new().within(min, max),
    };
    Ok(Some(spec))
}

fn inferred_type(property: &PropertySpec) -> (RuleSpec, RuleOptions) {
    let numeric = match property.kind {
        PropertyKind::Serial | PropertyKind::Integer => NumericSpec::new().only_integer(),
        PropertyKind::Float | PropertyKind::Decimal => {
            let mut spec = NumericSpec::new();
            if let Some(precision) = property.precision {
                spec = spec.precision(precision);
            }
            if let Some(scale) = property.scale {
                spec = spec.scale(scale);
            }
            spec
        }
        _ => return (RuleSpec::PrimitiveType, property.options_for("is_primitive")),
    };

    let numeric = match (&property.min, &property.max) {
        (Some(min), Some(max)) => numeric.gte(min.clone()).lte(max.clone()),
        (Some(min), None) => numeric.gte(min.clone()),
        (None, Some(max)) => numeric.lte(max.clone()),
        (None, None) => numeric,
    };
    (RuleSpec::Numeric(numeric), property.options_for("is_number"))
}
