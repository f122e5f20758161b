//! Core types shared by every rule.
//!
//! This module contains the pieces rules are evaluated against:
//! - The [`Subject`] contract and its collaborators
//! - Guard conditions (`if`/`unless`)
//! - The thread-scoped context stack
//! - Helpers over the JSON value model (nil, blank, string form)

pub mod context;
mod guard;
mod subject;
mod value;

pub use context::{with_context, ContextScope};
pub use guard::{Condition, Guard, Predicate};
pub use subject::{
    Identity, LookupError, MethodOutcome, PrimitiveType, Property, Subject, UniquenessLookup,
};
pub use value::{as_number, display_value, is_blank, is_nil, loosely_equal};
