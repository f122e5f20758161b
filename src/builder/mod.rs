//! Declaration API for rules.
//!
//! Rules are declared as a [`RuleSpec`] plus [`RuleOptions`], either by hand
//! or inferred from a [`PropertySpec`]. Specs resolve option aliases and
//! reject malformed declarations with a [`DeclarationError`] before any
//! subject is validated.

pub mod error;
pub mod inferred;
pub mod options;
pub mod spec;

pub use error::DeclarationError;
pub use inferred::{infer_rules, LengthLimit, PropertyKind, PropertySpec, Unique};
pub use options::RuleOptions;
pub use spec::{FormatSpec, LengthSpec, NumericSpec, RuleSpec};
