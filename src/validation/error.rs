//! Errors raised while validating.

use crate::core::LookupError;
use thiserror::Error;

/// A failure of the validation machinery itself, as opposed to a subject
/// being invalid.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("`{context}` is an invalid context, known contexts are [{}]", .known.join(", "))]
    InvalidContext { context: String, known: Vec<String> },

    #[error("{model} has no condition named `{name}`")]
    UnknownCondition { model: String, name: String },

    #[error("{model} has no validation method named `{name}`")]
    UnknownMethod { model: String, name: String },

    #[error("{model} has no uniqueness lookup configured")]
    MissingCollaborator { model: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
