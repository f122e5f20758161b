//! Running rules and reporting their failures.
//!
//! This module contains:
//! - [`RuleSet`]: the rules of one context
//! - [`ContextualRuleSet`]: a subject type's rules across contexts
//! - [`Violation`] and [`ViolationSet`]: failures as data
//! - Message transformers that render violations as text

pub mod config;
pub mod contextual;
pub mod error;
pub mod rule_set;
pub mod transformer;
pub mod validatable;
pub mod violation;

pub use config::{ValidationConfig, DEFAULT_CONTEXT};
pub use contextual::ContextualRuleSet;
pub use error::ValidationError;
pub use rule_set::RuleSet;
pub use transformer::{
    default_transformer, set_default_transformer, DefaultHumanizer, DefaultTransformer, Humanizer,
    MessageTransformer,
};
pub use validatable::Validatable;
pub use violation::{Violation, ViolationSet, ViolationType};
