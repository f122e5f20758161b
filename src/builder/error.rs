//! Errors raised while declaring rules.

use serde_json::Value;
use thiserror::Error;

/// A malformed rule declaration.
///
/// These are programmer errors: they are raised when the rule is declared,
/// before any subject is validated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeclarationError {
    #[error("length rule on `{attribute}` needs a minimum, maximum, exact length, or range")]
    UnboundLength { attribute: String },

    #[error("length range on `{attribute}` has no upper bound; use a minimum instead")]
    InfiniteLengthRange { attribute: String },

    #[error("unknown predefined format `{0}`")]
    UnknownFormat(String),

    #[error("precision {precision:?} and scale {scale:?} cannot describe a decimal number")]
    InvalidPrecision {
        precision: Option<u32>,
        scale: Option<u32>,
    },

    #[error("confirmation rule on `{attribute}` has an empty confirmation attribute")]
    MissingConfirmationTarget { attribute: String },

    #[error("block rule on `{attribute}` has no block")]
    MissingBlock { attribute: String },

    #[error("uniqueness rule on `{attribute}` has an invalid scope entry `{scope}`")]
    InvalidScope { attribute: String, scope: String },

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("range {min:?}..={max:?} is empty or unbounded on both sides")]
    InvalidRange {
        min: Option<Value>,
        max: Option<Value>,
    },

    #[error("numeric bound {0} is not a number")]
    NonNumericBound(Value),

    #[error("option `{option}` has an invalid value {value}")]
    InvalidOption { option: String, value: Value },
}
